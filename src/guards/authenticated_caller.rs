use crate::configuration::ApplicationSettings;
use crate::guards::{BasicAuth, OrStatus};
use anyhow::anyhow;
use rocket::http::Status;
use rocket::outcome::try_outcome;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use secrecy::ExposeSecret;

/// A caller whose Basic credentials match the configured ones.
pub struct AuthenticatedCaller {
    pub username: String,
    // prevents construction outside of this module
    _private: (),
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedCaller {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let expected = match request
            .rocket()
            .state::<ApplicationSettings>()
            .or_status(
                Status::InternalServerError,
                "Caller credentials are not configured.",
            ) {
            Ok(expected) => expected,
            Err(failure) => return Outcome::Error(failure),
        };
        let basic_auth = try_outcome!(request.guard::<BasicAuth>().await);

        match authenticate(basic_auth, expected) {
            Ok(caller) => Outcome::Success(caller),
            Err(e) => Outcome::Error((Status::Unauthorized, e)),
        }
    }
}

fn authenticate(
    basic_auth: BasicAuth,
    expected: &ApplicationSettings,
) -> Result<AuthenticatedCaller, anyhow::Error> {
    if basic_auth.username != expected.username
        || basic_auth.password.expose_secret() != expected.password.expose_secret()
    {
        return Err(anyhow!("Invalid username or password."));
    }
    Ok(AuthenticatedCaller {
        username: basic_auth.username,
        _private: (),
    })
}
