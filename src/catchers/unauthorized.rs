use rocket::http::Header;

#[catch(401)]
pub fn unauthorized_request_credentials() -> RequestBasicAuth {
    RequestBasicAuth::default()
}

struct BasicRealm;

impl<'h> From<BasicRealm> for Header<'h> {
    fn from(_: BasicRealm) -> Self {
        Header::new("WWW-Authenticate", r#"Basic realm="emails""#)
    }
}

/// Empty 401 answer asking the caller for Basic credentials.
#[derive(Responder)]
#[response(status = 401)]
pub struct RequestBasicAuth {
    inner: (),
    realm: BasicRealm,
}

impl Default for RequestBasicAuth {
    fn default() -> Self {
        RequestBasicAuth {
            inner: (),
            realm: BasicRealm,
        }
    }
}
