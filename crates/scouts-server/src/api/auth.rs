use crate::api::{ApiError, AppState};
use crate::session::{Authorization, SessionToken, SESSION_TTL};
use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

/// Name of the session cookie.
pub(crate) const SESSION_COOKIE: &str = "session";

/// Resolve the caller's session, minting one when the cookie is absent, and
/// stash the resulting [`Authorization`] in request extensions. A freshly
/// minted token is set on the response.
pub(crate) async fn authorize(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookie_token = session_cookie(&request)
        .map(|value| value.parse::<SessionToken>())
        .transpose()?;

    let (token, minted) = match cookie_token {
        Some(token) => (token, false),
        None => (state.sessions.create_session().await?, true),
    };

    let user_id = state.sessions.query_session(token).await?;
    let authorization = Authorization {
        session: token,
        user_id,
    };
    request.extensions_mut().insert(authorization);

    let mut response = next.run(request).await;
    if minted {
        if let Ok(value) = HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={}; Max-Age={}; Path=/; SameSite=None; Secure",
            token.encode(),
            SESSION_TTL.as_secs(),
        )) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    Ok(response)
}

fn session_cookie(request: &Request) -> Option<&str> {
    let header = request.headers().get(COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_cookie(value: &str) -> Request {
        Request::builder()
            .header(COOKIE, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn finds_session_cookie_among_others() {
        let token = SessionToken::generate();
        let request =
            request_with_cookie(&format!("theme=dark; session={}; lang=en", token.encode()));
        assert_eq!(session_cookie(&request), Some(token.encode()).as_deref());
    }

    #[test]
    fn absent_cookie_is_none() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(session_cookie(&request), None);

        let request = request_with_cookie("theme=dark");
        assert_eq!(session_cookie(&request), None);
    }
}
