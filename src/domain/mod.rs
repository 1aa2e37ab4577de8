mod email_message;
mod subscriber_email;

pub use email_message::{Alternative, EmailMessage, HTML_MIME_TYPE};
pub use subscriber_email::SubscriberEmail;
