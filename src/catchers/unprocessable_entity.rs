use rocket::response::status::BadRequest;
use rocket::Request;

/// Malformed JSON bodies are reported as 400 rather than Rocket's 422.
#[catch(422)]
pub fn unprocessable_entity_to_bad_request(_req: &Request) -> BadRequest<()> {
    BadRequest(())
}
