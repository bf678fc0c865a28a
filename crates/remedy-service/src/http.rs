use std::time::Duration;

use async_trait::async_trait;
use remedy_core::form::{EntryList, EntryPayload, FormEntry, FormName, FormValues};
use remedy_core::RemedyError;
use reqwest::header::LOCATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{AttachmentPart, FormService};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How to authenticate against the AR server.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Pre-issued AR-JWT token. The username, when given, is used as the
    /// work log submitter.
    Token {
        token: String,
        username: Option<String>,
    },
    /// Exchange a username and password for a token at start-up.
    Password { username: String, password: String },
}

/// AR REST client implementation of FormService.
pub struct HttpFormService {
    base_url: Url,
    client: Client,
    token: Option<String>,
    username: Option<String>,
}

impl HttpFormService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemedyError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| RemedyError::Config(format!("invalid server url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RemedyError::Config(format!(
                "server url {base_url} cannot carry a path"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemedyError::Config(format!("http client: {e}")))?;
        Ok(Self {
            base_url,
            client,
            token: None,
            username: None,
        })
    }

    pub fn with_token(
        base_url: &str,
        timeout: Duration,
        token: String,
        username: Option<String>,
    ) -> Result<Self, RemedyError> {
        let mut svc = Self::new(base_url, timeout)?;
        svc.token = Some(token);
        svc.username = username;
        Ok(svc)
    }

    /// Build a client and authenticate it with `credentials`.
    pub async fn connect(
        base_url: &str,
        timeout: Duration,
        credentials: Credentials,
    ) -> Result<Self, RemedyError> {
        match credentials {
            Credentials::Token { token, username } => {
                Self::with_token(base_url, timeout, token, username)
            }
            Credentials::Password { username, password } => {
                let mut svc = Self::new(base_url, timeout)?;
                svc.login(&username, &password).await?;
                Ok(svc)
            }
        }
    }

    /// Exchange credentials for an AR-JWT token.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), RemedyError> {
        let url = self.url(&["api", "jwt", "login"])?;
        let resp = self
            .client
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error_with_status(status, resp).await);
        }
        let token = resp
            .text()
            .await
            .map_err(|e| RemedyError::Decode(format!("read token: {e}")))?;
        if token.trim().is_empty() {
            return Err(RemedyError::Unauthorized("empty token in login response".into()));
        }
        self.token = Some(token.trim().to_string());
        self.username = Some(username.to_string());
        debug!("logged in to {} as {username}", self.base_url);
        Ok(())
    }

    /// Release the current token. A no-op when not logged in.
    pub async fn logout(&mut self) -> Result<(), RemedyError> {
        if self.token.is_none() {
            return Ok(());
        }
        let url = self.url(&["api", "jwt", "logout"])?;
        let resp = self
            .with_auth(self.client.post(url))
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error_with_status(status, resp).await);
        }
        self.token = None;
        Ok(())
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", format!("AR-JWT {token}")),
            None => builder,
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, RemedyError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemedyError::Config(format!("bad base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn entry_url(&self, form: FormName, request_id: Option<&str>) -> Result<Url, RemedyError> {
        match request_id {
            Some(id) => self.url(&["api", "arsys", "v1", "entry", form.as_str(), id]),
            None => self.url(&["api", "arsys", "v1", "entry", form.as_str()]),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, RemedyError> {
        debug!("GET {url}");
        let resp = self
            .with_auth(self.client.get(url))
            .send()
            .await
            .map_err(transport)?;
        handle_response(resp).await
    }

    async fn put_entry(&self, url: Url, builder: RequestBuilder) -> Result<u16, RemedyError> {
        debug!("PUT {url}");
        let resp = self.with_auth(builder).send().await.map_err(transport)?;
        let status = resp.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(parse_error_with_status(status, resp).await)
        }
    }
}

fn transport(e: reqwest::Error) -> RemedyError {
    RemedyError::Transport(e.to_string())
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, RemedyError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| RemedyError::Decode(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

/// One element of the error array AR returns on failure.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArMessage {
    #[serde(default)]
    message_text: String,
    #[serde(default)]
    message_appended_text: Option<String>,
    #[serde(default)]
    message_number: Option<i64>,
}

fn ar_message(body: &str) -> Option<String> {
    let messages: Vec<ArMessage> = serde_json::from_str(body).ok()?;
    let first = messages.into_iter().next()?;
    let mut msg = match first.message_number {
        Some(n) => format!("ARERR {n}: {}", first.message_text),
        None => first.message_text,
    };
    if let Some(extra) = first.message_appended_text.filter(|s| !s.is_empty()) {
        msg.push_str(&format!(" ({extra})"));
    }
    Some(msg)
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> RemedyError {
    let body = resp.text().await.unwrap_or_default();
    let msg = ar_message(&body).unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => RemedyError::NotFound(msg),
        StatusCode::BAD_REQUEST => RemedyError::InvalidInput(msg),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemedyError::Unauthorized(msg),
        _ => RemedyError::Api {
            status: status.as_u16(),
            message: msg,
        },
    }
}

#[async_trait]
impl FormService for HttpFormService {
    fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    async fn query_entries(
        &self,
        form: FormName,
        qualification: &str,
    ) -> Result<Vec<FormEntry>, RemedyError> {
        let mut url = self.entry_url(form, None)?;
        url.query_pairs_mut().append_pair("q", qualification);
        let list: EntryList = self.get_json(url).await?;
        Ok(list.entries)
    }

    async fn get_entry(&self, form: FormName, request_id: &str) -> Result<FormEntry, RemedyError> {
        self.get_json(self.entry_url(form, Some(request_id))?).await
    }

    async fn create_entry(
        &self,
        form: FormName,
        values: &FormValues,
    ) -> Result<FormEntry, RemedyError> {
        let url = self.entry_url(form, None)?;
        debug!("POST {url}");
        let resp = self
            .with_auth(self.client.post(url).json(&EntryPayload { values }))
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error_with_status(status, resp).await);
        }

        // AR answers 201 with a Location header and, unless return fields
        // were requested, an empty body.
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp
            .bytes()
            .await
            .map_err(|e| RemedyError::Decode(format!("read body: {e}")))?;
        if !body.is_empty() {
            return serde_json::from_slice(&body)
                .map_err(|e| RemedyError::Decode(format!("json decode: {e}")));
        }
        match location {
            Some(loc) => {
                let url = self
                    .base_url
                    .join(&loc)
                    .map_err(|e| RemedyError::Decode(format!("bad location {loc}: {e}")))?;
                self.get_json(url).await
            }
            None => Err(RemedyError::Decode(
                "create returned neither a body nor a location".into(),
            )),
        }
    }

    async fn update_entry(
        &self,
        form: FormName,
        request_id: &str,
        values: &FormValues,
    ) -> Result<u16, RemedyError> {
        let url = self.entry_url(form, Some(request_id))?;
        let builder = self.client.put(url.clone()).json(&EntryPayload { values });
        self.put_entry(url, builder).await
    }

    async fn update_entry_with_attachment(
        &self,
        form: FormName,
        request_id: &str,
        values: &FormValues,
        attachment: AttachmentPart,
    ) -> Result<u16, RemedyError> {
        let entry_json = serde_json::to_string(&EntryPayload { values })
            .map_err(|e| RemedyError::InvalidInput(format!("encode entry: {e}")))?;
        let entry_part = Part::text(entry_json)
            .mime_str("application/json")
            .map_err(|e| RemedyError::InvalidInput(format!("entry part: {e}")))?;
        let file_part = Part::bytes(Vec::from(attachment.data))
            .file_name(attachment.file_name)
            .mime_str(&attachment.content_type)
            .map_err(|e| {
                RemedyError::InvalidInput(format!(
                    "content type {}: {e}",
                    attachment.content_type
                ))
            })?;
        let multipart = Form::new()
            .part("entry", entry_part)
            .part(format!("attach-{}", attachment.field), file_part);

        let url = self.entry_url(form, Some(request_id))?;
        let builder = self.client.put(url.clone()).multipart(multipart);
        self.put_entry(url, builder).await
    }

    async fn get_form_fields(
        &self,
        form: &str,
        field_ids: Option<&str>,
    ) -> Result<Value, RemedyError> {
        let url = match field_ids {
            Some(ids) => self.url(&["api", "arsys", "v1.0", "fields", form, ids])?,
            None => self.url(&["api", "arsys", "v1.0", "fields", form])?,
        };
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_urls_encode_form_names() {
        let svc = HttpFormService::new("https://itsm.example.org:8443/", DEFAULT_TIMEOUT).unwrap();
        let url = svc.entry_url(FormName::HelpDesk, None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://itsm.example.org:8443/api/arsys/v1/entry/HPD:Help%20Desk"
        );
        let url = svc.entry_url(FormName::Task, Some("TAS000000000123")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://itsm.example.org:8443/api/arsys/v1/entry/TMS:Task/TAS000000000123"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let svc = HttpFormService::new("https://gw.example.org/remedy", DEFAULT_TIMEOUT).unwrap();
        let url = svc.url(&["api", "jwt", "login"]).unwrap();
        assert_eq!(url.as_str(), "https://gw.example.org/remedy/api/jwt/login");
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let err = HttpFormService::new("not a url", DEFAULT_TIMEOUT).err().unwrap();
        assert!(matches!(err, RemedyError::Config(_)));
    }

    #[test]
    fn ar_error_body_is_unwrapped() {
        let body = r#"[{"messageType":"ERROR","messageText":"Required field cannot be blank.",
                        "messageAppendedText":"WOI:WorkOrderInterface : Summary",
                        "messageNumber":326}]"#;
        assert_eq!(
            ar_message(body).unwrap(),
            "ARERR 326: Required field cannot be blank. (WOI:WorkOrderInterface : Summary)"
        );
        assert!(ar_message("plain text").is_none());
    }
}
