// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::info;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use crate::{
    error::{Error, Result},
    request::Request,
    session::Role,
    transport::{Multipart, Part},
};

use super::{Access, Executor, Portal};

/// An uploaded photo of one side of an identity card.
#[derive(Clone, Debug)]
pub struct Image {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A citizen's request to open an account. The backend queues it for an
/// administrator to approve.
#[derive(Clone, Debug)]
pub struct Register {
    pub data: Value,
    pub id_front: Image,
    pub id_back: Image,
}

/// Accepts `type/subtype` with optional parameters, the shape multipart
/// encoders insist on.
fn is_media_type(value: &str) -> bool {
    let token = |part: &str| {
        !part.is_empty()
            && part
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
    };
    let essence = value.split(';').next().unwrap_or_default().trim();
    essence
        .split_once('/')
        .map_or(false, |(kind, subtype)| token(kind) && token(subtype))
}

fn is_egn(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

impl TryFrom<Register> for Request {
    type Error = Error;

    fn try_from(value: Register) -> Result<Self, Self::Error> {
        if !value.data.is_object() {
            return Err(Error::validation("registration data must be a JSON object"));
        }
        let image = |name: &str, photo: Image| {
            if photo.bytes.is_empty() {
                return Err(Error::validation(format!("the {name} image is empty")));
            }
            if !is_media_type(&photo.content_type) {
                return Err(Error::validation(format!(
                    "the {name} image has an invalid content type {:?}",
                    photo.content_type
                )));
            }
            Ok(Part::new(name, photo.bytes)
                .with_filename(photo.filename)
                .with_content_type(photo.content_type))
        };

        let form = Multipart::new()
            .part(Part::new("data", value.data.to_string()).with_content_type("application/json"))
            .part(image("idFront", value.id_front)?)
            .part(image("idBack", value.id_back)?);
        Ok(Self::post("/api/auth/register").with_multipart(form))
    }
}

impl Executor for Register {
    type Response = Value;
    const ACCESS: Access = Access::Public;
}

fn login_body(identifier: &str, password: &SecretString) -> Value {
    json!({
        "identifier": identifier.trim(),
        "password": password.expose_secret(),
    })
}

pub struct LoginCitizen {
    pub egn: String,
    pub password: SecretString,
}

impl From<LoginCitizen> for Request {
    fn from(value: LoginCitizen) -> Self {
        Self::post("/api/auth/login").with_json(login_body(&value.egn, &value.password))
    }
}

impl Executor for LoginCitizen {
    type Response = Value;
    const ACCESS: Access = Access::Public;
}

pub struct LoginAdministrator {
    pub username: String,
    pub password: SecretString,
}

impl From<LoginAdministrator> for Request {
    fn from(value: LoginAdministrator) -> Self {
        Self::post("/api/admin/auth/login").with_json(login_body(&value.username, &value.password))
    }
}

impl Executor for LoginAdministrator {
    type Response = Value;
    const ACCESS: Access = Access::Public;
}

impl Portal {
    /// Logs in with the backend and, when it accepts the credentials, makes
    /// them the active session. Returns the backend's login response.
    pub async fn login(&self, role: Role, identifier: &str, secret: &SecretString) -> Result<Value> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(Error::validation(match role {
                Role::Citizen => "an EGN is required",
                Role::Administrator => "a username is required",
            }));
        }
        if role == Role::Citizen && !is_egn(identifier) {
            return Err(Error::validation("an EGN is exactly 10 digits"));
        }
        if secret.expose_secret().is_empty() {
            return Err(Error::validation("a password is required"));
        }

        let response = match role {
            Role::Citizen => {
                LoginCitizen {
                    egn: identifier.to_owned(),
                    password: secret.clone(),
                }
                .execute(self)
                .await?
            }
            Role::Administrator => {
                LoginAdministrator {
                    username: identifier.to_owned(),
                    password: secret.clone(),
                }
                .execute(self)
                .await?
            }
        };

        let _ = self.session().set_session(role, identifier, secret).await?;
        self.snapshots().record(role, identifier, &response).await;
        info!("Logged in as {} {}", role, identifier);

        Ok(response)
    }

    /// Ends the session and forgets the profile snapshots. Safe to call when
    /// nobody is logged in.
    pub async fn logout(&self) -> Result<()> {
        self.session().clear_session().await?;
        self.snapshots().clear().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{header::AUTHORIZATION, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::{
        api::{testing, user::Me},
        error::Kind,
        transport::{double::Scripted, Body, Inbound},
    };

    fn secret(value: &str) -> SecretString {
        SecretString::new(value.to_owned())
    }

    fn sent_json(body: &Option<Body>) -> Value {
        match *body {
            Some(Body::Json(ref bytes)) => serde_json::from_slice(bytes).unwrap(),
            _ => panic!("expected a JSON body, got {body:?}"),
        }
    }

    #[tokio::test]
    async fn citizen_login_sets_the_session_used_by_later_calls() {
        let (portal, transport) = testing::portal(Scripted::replying(Inbound::json(
            StatusCode::OK,
            &json!({"fullName": "Ivan Petrov"}),
        )));

        let response = portal
            .login(Role::Citizen, " 1234567890 ", &secret("pw"))
            .await
            .unwrap();
        assert_eq!(response, json!({"fullName": "Ivan Petrov"}));
        assert_eq!(portal.current_role().await, Some(Role::Citizen));

        let login = &transport.requests()[0];
        assert_eq!(login.url.path(), "/api/auth/login");
        assert_eq!(
            sent_json(&login.body),
            json!({"identifier": "1234567890", "password": "pw"})
        );
        assert!(login.headers.get(AUTHORIZATION).is_none());

        let _ = Me.execute(&portal).await.unwrap();
        let me = &transport.requests()[1];
        assert_eq!(me.url.path(), "/api/users/me");
        assert_eq!(
            me.headers.get(AUTHORIZATION).unwrap().to_str().unwrap(),
            format!("Basic {}", base64::encode("1234567890:pw"))
        );

        assert_eq!(
            portal.snapshots().get(Role::Citizen).await,
            Some(json!({"fullName": "Ivan Petrov", "egn": "1234567890", "role": "citizen"}))
        );
    }

    #[tokio::test]
    async fn administrator_login_uses_the_admin_endpoint() {
        let (portal, transport) =
            testing::portal(Scripted::replying(Inbound::json(StatusCode::OK, &json!({}))));

        let _ = portal
            .login(Role::Administrator, "root", &secret("pw"))
            .await
            .unwrap();
        assert_eq!(transport.requests()[0].url.path(), "/api/admin/auth/login");
        assert_eq!(portal.current_role().await, Some(Role::Administrator));
    }

    #[tokio::test]
    async fn rejected_login_leaves_no_session() {
        let (portal, _) = testing::portal(Scripted::replying(Inbound::json(
            StatusCode::UNAUTHORIZED,
            &json!({"message": "Invalid credentials"}),
        )));

        let err = portal
            .login(Role::Citizen, "1234567890", &secret("wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Http(401));
        assert_eq!(err.message(), "Invalid credentials");
        assert!(!portal.has_active_session().await);
    }

    #[tokio::test]
    async fn blank_credentials_never_reach_the_backend() {
        let (portal, transport) = testing::portal(Scripted::echo());

        let err = portal
            .login(Role::Citizen, "   ", &secret("pw"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
        let err = portal
            .login(Role::Administrator, "root", &secret(""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn citizens_log_in_with_a_ten_digit_egn() {
        let (portal, transport) = testing::portal(Scripted::echo());

        for egn in ["123456789", "12345678901", "12345abcde"] {
            let err = portal
                .login(Role::Citizen, egn, &secret("pw"))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), Kind::Validation);
            assert_eq!(err.message(), "an EGN is exactly 10 digits");
        }
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn logout_clears_everything_and_is_idempotent() {
        let (portal, _) =
            testing::portal(Scripted::replying(Inbound::json(StatusCode::OK, &json!({}))));
        portal.logout().await.unwrap();

        let _ = portal
            .login(Role::Citizen, "1234567890", &secret("pw"))
            .await
            .unwrap();
        portal.logout().await.unwrap();
        portal.logout().await.unwrap();

        assert!(!portal.has_active_session().await);
        assert_eq!(portal.snapshots().get(Role::Citizen).await, None);
    }

    #[tokio::test]
    async fn registration_is_sent_as_multipart() {
        let (portal, transport) =
            testing::portal(Scripted::replying(Inbound::new(StatusCode::CREATED)));
        let image = |name: &str| Image {
            filename: format!("{name}.png"),
            content_type: "image/png".to_owned(),
            bytes: vec![1, 2, 3],
        };

        let _ = Register {
            data: json!({"egn": "1234567890", "email": "ivan@example.com"}),
            id_front: image("front"),
            id_back: image("back"),
        }
        .execute(&portal)
        .await
        .unwrap();

        let sent = &transport.requests()[0];
        assert!(sent.headers.get(AUTHORIZATION).is_none());
        let form = match sent.body {
            Some(Body::Multipart(ref form)) => form,
            _ => panic!("expected a multipart body"),
        };
        let data = form.get("data").unwrap();
        assert_eq!(data.content_type.as_deref(), Some("application/json"));
        assert_eq!(
            serde_json::from_slice::<Value>(&data.bytes).unwrap(),
            json!({"egn": "1234567890", "email": "ivan@example.com"})
        );
        assert_eq!(form.get("idFront").unwrap().filename.as_deref(), Some("front.png"));
        assert_eq!(form.get("idBack").unwrap().bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn registration_requires_both_images() {
        let (portal, transport) = testing::portal(Scripted::echo());
        let err = Register {
            data: json!({}),
            id_front: Image {
                filename: "front.png".to_owned(),
                content_type: "image/png".to_owned(),
                bytes: vec![1],
            },
            id_back: Image {
                filename: "back.png".to_owned(),
                content_type: "image/png".to_owned(),
                bytes: Vec::new(),
            },
        }
        .execute(&portal)
        .await
        .unwrap_err();

        assert_eq!(err.message(), "the idBack image is empty");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn registration_rejects_bad_image_content_types() {
        let (portal, transport) = testing::portal(Scripted::echo());
        let image = |content_type: &str| Image {
            filename: "card.png".to_owned(),
            content_type: content_type.to_owned(),
            bytes: vec![1],
        };

        let err = Register {
            data: json!({}),
            id_front: image("not a mime"),
            id_back: image("image/png"),
        }
        .execute(&portal)
        .await
        .unwrap_err();

        assert_eq!(err.kind(), Kind::Validation);
        assert_eq!(err.status_code(), None);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn media_types_need_a_type_and_subtype() {
        assert!(is_media_type("image/png"));
        assert!(is_media_type("application/json; charset=utf-8"));
        assert!(!is_media_type("png"));
        assert!(!is_media_type("image/"));
        assert!(!is_media_type("image png/x"));
    }
}
