use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;
use signet_shared::fields::{field_label, sanitize_label, FieldId, FieldType, SignatureField};
use signet_shared::geometry::NormalizedPosition;
use signet_shared::models::{Envelope, FlowType, Recipient};
use signet_shared::registry::FieldRegistry;
use uuid::Uuid;

/// Header carrying the guest signing token from the invitation link.
pub const SIGNATURE_TOKEN_HEADER: &str = "X-Signature-Token";

/// How often a running batch job is re-checked.
pub const BATCH_POLL_INTERVAL_MS: u32 = 2_000;

/// Reduce a data URL to its base64 payload. Values that are not data URLs
/// pass through unchanged, so already-stripped payloads stay valid.
pub fn strip_data_url(value: &str) -> &str {
    match value.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => value,
    }
}

fn wire_field_key(id: FieldId) -> String {
    match id {
        FieldId::Persisted(id) => id.to_string(),
        FieldId::Local(n) => format!("local-{n}"),
    }
}

fn field_to_wire(field: &SignatureField) -> serde_json::Value {
    serde_json::json!({
        "page": field.page,
        "document_id": field.document_id,
        "field_type": field.field_type,
        "recipient_id": field.recipient_id,
        "position": field.position,
        "name": field.name,
        "required": field.required,
    })
}

/// Build the PATCH body that persists the builder's state: recipients in
/// their current order, the full field list, and the signing flow.
pub fn build_update_payload(
    recipients: &[Recipient],
    fields: &[SignatureField],
    flow_type: FlowType,
) -> serde_json::Value {
    let fields_json: Vec<serde_json::Value> = fields.iter().map(field_to_wire).collect();
    serde_json::json!({
        "recipients": recipients,
        "fields": fields_json,
        "flow_type": flow_type,
    })
}

/// Build the signing body: one map of field key to base64 image, one map of
/// field key to field state. Keys are the backend's field ids.
pub fn build_sign_payload(fields: &[SignatureField]) -> serde_json::Value {
    let mut signature_data = serde_json::Map::new();
    let mut signed_fields = serde_json::Map::new();
    for field in fields {
        let key = wire_field_key(field.id);
        if let Some(data) = &field.signature_data {
            signature_data.insert(
                key.clone(),
                serde_json::Value::String(strip_data_url(data).to_string()),
            );
        }
        let mut state = field_to_wire(field);
        if let Some(object) = state.as_object_mut() {
            object.insert("signed".to_string(), serde_json::json!(field.signed));
            object.insert("editable".to_string(), serde_json::json!(field.editable));
            if let FieldId::Persisted(id) = field.id {
                object.insert("id".to_string(), serde_json::json!(id));
            }
        }
        signed_fields.insert(key, state);
    }
    serde_json::json!({
        "signature_data": signature_data,
        "signed_fields": signed_fields,
    })
}

/// Build the placements entry for the self-sign and batch endpoints.
pub fn build_placement(page: u32, position: &NormalizedPosition) -> serde_json::Value {
    serde_json::json!({
        "page": page,
        "x": position.x,
        "y": position.y,
        "width": position.width,
        "height": position.height,
    })
}

/// Build a guest signing link from origin, envelope ID and access token.
pub fn build_sign_link(origin: &str, envelope_id: i64, token: &str) -> String {
    format!("{}/sign/{}?token={}", origin, envelope_id, token)
}

/// Resolve a backend-supplied URL that may be relative against the origin.
pub fn absolute_url(origin: &str, raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            raw.trim_start_matches('/')
        )
    }
}

pub fn window_origin() -> String {
    // In production, same origin. In dev, the trunk proxy forwards /api.
    let window = web_sys::window().unwrap();
    window.location().origin().unwrap()
}

fn api_url(path: &str) -> String {
    format!("{}/api/signature/{}", window_origin(), path)
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

fn client_request(method: Method, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
    let mut request = reqwest::Client::new().request(method, api_url(path));
    if let Some(token) = token {
        request = request.header(SIGNATURE_TOKEN_HEADER, token);
    }
    request
}

/// Map an error status onto the backend's own message when it sent one.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, String> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.or(b.detail))
        .unwrap_or_else(|| format!("request failed with status {status}"));
    Err(message)
}

async fn get_json<T: for<'de> Deserialize<'de>>(
    path: &str,
    token: Option<&str>,
) -> Result<T, String> {
    let resp = client_request(Method::GET, path, token)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    check_status(resp)
        .await?
        .json()
        .await
        .map_err(|e| e.to_string())
}

/// POST/PATCH where only success matters; the response body is dropped.
async fn send_ok(
    method: Method,
    path: &str,
    body: &serde_json::Value,
    token: Option<&str>,
) -> Result<(), String> {
    let resp = client_request(method, path, token)
        .json(body)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    check_status(resp).await.map(|_| ())
}

async fn get_bytes(path: &str, token: Option<&str>) -> Result<Vec<u8>, String> {
    let resp = client_request(Method::GET, path, token)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let bytes = check_status(resp)
        .await?
        .bytes()
        .await
        .map_err(|e| e.to_string())?;
    Ok(bytes.to_vec())
}

// Types mirroring the signature API

/// One field as the backend serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldData {
    #[serde(default)]
    pub id: Option<i64>,
    pub page: u32,
    #[serde(default)]
    pub document_id: Option<i64>,
    pub field_type: FieldType,
    pub recipient_id: u32,
    pub position: NormalizedPosition,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub signed: bool,
    #[serde(default = "default_true")]
    pub editable: bool,
    #[serde(default)]
    pub signature_data: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Envelope payload shared by the builder, guest and sign-page endpoints.
/// `recipient_id` identifies the caller on the signing variants.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopeDetail {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub fields: Vec<FieldData>,
    #[serde(default)]
    pub recipient_id: Option<u32>,
    #[serde(default)]
    pub document_url: Option<String>,
}

/// Seed a registry from wire fields, resolving display names through the
/// recipient list. Fields without a persisted id get local ids.
pub fn registry_from_fields(
    wire_fields: Vec<FieldData>,
    recipients: &[Recipient],
) -> FieldRegistry {
    let mut registry = FieldRegistry::new();
    for field in wire_fields {
        let id = match field.id {
            Some(persisted) => FieldId::Persisted(persisted),
            None => registry.next_id(),
        };
        let recipient_name = recipients
            .iter()
            .find(|r| r.order == field.recipient_id)
            .map(|r| sanitize_label(&r.full_name))
            .unwrap_or_default();
        let name = if field.name.is_empty() {
            field_label(field.field_type, &recipient_name)
        } else {
            field.name
        };
        registry.add_field(SignatureField {
            id,
            page: field.page,
            document_id: field.document_id,
            recipient_id: field.recipient_id,
            field_type: field.field_type,
            position: field.position,
            required: field.required,
            name,
            recipient_name,
            signed: field.signed,
            signature_data: field.signature_data,
            editable: field.editable,
        });
    }
    registry
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SavedSignature {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchJobStatus {
    Pending,
    Running,
    Completed,
    Partial,
    Failed,
    #[serde(other)]
    Unknown,
}

impl BatchJobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BatchJobStatus::Completed | BatchJobStatus::Partial | BatchJobStatus::Failed
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchJob {
    pub id: i64,
    pub status: BatchJobStatus,
    #[serde(default)]
    pub done: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub result_zip: Option<String>,
}

/// Guest access link data issued when an envelope is sent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignLink {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SendResult {
    #[serde(default)]
    sign_links: Vec<SignLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignerInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub signed_at: Option<String>,
}

/// Public proof payload behind a printed QR code.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub signers: Vec<SignerInfo>,
    #[serde(default)]
    pub hash_sha256: Option<String>,
    #[serde(default)]
    pub document_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DownloadInfo {
    download_url: String,
}

/// A file picked in the browser, ready for a multipart request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

fn file_part(file: &UploadFile) -> Result<Part, String> {
    let mime = if file.mime.is_empty() {
        "application/octet-stream"
    } else {
        &file.mime
    };
    Part::bytes(file.bytes.clone())
        .file_name(file.name.clone())
        .mime_str(mime)
        .map_err(|e| e.to_string())
}

// API functions

pub async fn create_envelope(title: &str, file: &UploadFile) -> Result<EnvelopeDetail, String> {
    let form = Form::new()
        .text("title", title.to_string())
        .text("status", "draft")
        .part("document_file", file_part(file)?);
    let resp = client_request(Method::POST, "envelopes/", None)
        .multipart(form)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    check_status(resp)
        .await?
        .json()
        .await
        .map_err(|e| e.to_string())
}

pub async fn fetch_envelope(id: i64) -> Result<EnvelopeDetail, String> {
    get_json(&format!("envelopes/{id}/"), None).await
}

/// Signing view of an envelope for the logged-in recipient.
pub async fn fetch_sign_page(id: i64) -> Result<EnvelopeDetail, String> {
    get_json(&format!("envelopes/{id}/sign-page/"), None).await
}

/// Signing view of an envelope for a link-invited guest.
pub async fn fetch_guest_envelope(id: i64, token: &str) -> Result<EnvelopeDetail, String> {
    get_json(&format!("envelopes/{id}/guest/"), Some(token)).await
}

pub async fn update_envelope(id: i64, payload: &serde_json::Value) -> Result<(), String> {
    send_ok(Method::PATCH, &format!("envelopes/{id}/"), payload, None).await
}

/// Attach more documents to a draft envelope.
pub async fn update_envelope_files(id: i64, files: &[UploadFile]) -> Result<(), String> {
    let mut form = Form::new();
    for file in files {
        form = form.part("files", file_part(file)?);
    }
    let resp = client_request(Method::PATCH, &format!("envelopes/{id}/"), None)
        .multipart(form)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    check_status(resp).await.map(|_| ())
}

/// Send the envelope. The response carries the guest access tokens the
/// backend issued, one per recipient, for share-link display.
pub async fn send_envelope(id: i64) -> Result<Vec<SignLink>, String> {
    let resp = client_request(Method::POST, &format!("envelopes/{id}/send/"), None)
        .json(&serde_json::json!({}))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let body: SendResult = check_status(resp)
        .await?
        .json()
        .await
        .map_err(|e| e.to_string())?;
    Ok(body.sign_links)
}

pub async fn send_otp(id: i64, token: &str) -> Result<(), String> {
    send_ok(
        Method::POST,
        &format!("envelopes/{id}/send_otp/"),
        &serde_json::json!({}),
        Some(token),
    )
    .await
}

pub async fn verify_otp(id: i64, code: &str, token: &str) -> Result<(), String> {
    send_ok(
        Method::POST,
        &format!("envelopes/{id}/verify_otp/"),
        &serde_json::json!({ "otp": code }),
        Some(token),
    )
    .await
}

/// Submit signatures; guests go through the token route, recipients with an
/// account through the authenticated one.
pub async fn sign_envelope(
    id: i64,
    payload: &serde_json::Value,
    token: Option<&str>,
) -> Result<(), String> {
    let path = if token.is_some() {
        format!("envelopes/{id}/sign/")
    } else {
        format!("envelopes/{id}/sign_authenticated/")
    };
    send_ok(Method::POST, &path, payload, token).await
}

pub async fn fetch_saved_signatures() -> Result<Vec<SavedSignature>, String> {
    get_json("saved-signatures/", None).await
}

/// Fetch a saved signature image and re-encode it as a data URL, so it can
/// be assigned to a field exactly like a fresh upload.
pub async fn fetch_saved_signature_data(id: i64) -> Result<String, String> {
    let resp = client_request(Method::GET, &format!("saved-signatures/{id}/image/"), None)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let resp = check_status(resp).await?;
    let mime = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/png")
        .to_string();
    let bytes = resp.bytes().await.map_err(|e| e.to_string())?;
    Ok(format!("data:{};base64,{}", mime, B64.encode(&bytes)))
}

/// Raw bytes of one document. Guests fetch the decrypted stream with their
/// token; authenticated viewers fetch per-document files.
pub async fn fetch_document_bytes(
    envelope_id: i64,
    document_id: Option<i64>,
    token: Option<&str>,
) -> Result<Vec<u8>, String> {
    match token {
        Some(token) => {
            let resp = client_request(
                Method::GET,
                &format!("envelopes/{envelope_id}/document/"),
                Some(token),
            )
            .query(&[("token", token)])
            .send()
            .await
            .map_err(|e| e.to_string())?;
            let bytes = check_status(resp)
                .await?
                .bytes()
                .await
                .map_err(|e| e.to_string())?;
            Ok(bytes.to_vec())
        }
        None => match document_id {
            Some(doc) => {
                get_bytes(
                    &format!("envelopes/{envelope_id}/documents/{doc}/file/"),
                    None,
                )
                .await
            }
            None => fetch_envelope_download(envelope_id).await,
        },
    }
}

/// Resolve the envelope's download URL (signed copy when available, original
/// otherwise) and fetch it.
pub async fn fetch_envelope_download(id: i64) -> Result<Vec<u8>, String> {
    let info: DownloadInfo = get_json(&format!("envelopes/{id}/download/"), None).await?;
    let url = absolute_url(&window_origin(), &info.download_url);
    let resp = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let bytes = check_status(resp)
        .await?
        .bytes()
        .await
        .map_err(|e| e.to_string())?;
    Ok(bytes.to_vec())
}

fn sign_wizard_form(
    files_key: &str,
    files: &[UploadFile],
    placement: &serde_json::Value,
    signature_image: &UploadFile,
) -> Result<Form, String> {
    let mut form = Form::new();
    for file in files {
        form = form.part(files_key.to_string(), file_part(file)?);
    }
    Ok(form
        .text(
            "placements",
            serde_json::Value::Array(vec![placement.clone()]).to_string(),
        )
        .part("signature_image", file_part(signature_image)?))
}

/// Sign one document in place; the response body is the signed PDF.
pub async fn self_sign_sync(
    file: &UploadFile,
    placement: &serde_json::Value,
    signature_image: &UploadFile,
) -> Result<Vec<u8>, String> {
    let form = sign_wizard_form(
        "files[]",
        std::slice::from_ref(file),
        placement,
        signature_image,
    )?
    .text("sync", "true");
    let resp = client_request(Method::POST, "self-sign/", None)
        .multipart(form)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let bytes = check_status(resp)
        .await?
        .bytes()
        .await
        .map_err(|e| e.to_string())?;
    Ok(bytes.to_vec())
}

/// Stamp the same placement onto a stack of unrelated documents.
pub async fn create_batch_sign(
    files: &[UploadFile],
    placement: &serde_json::Value,
    signature_image: &UploadFile,
) -> Result<BatchJob, String> {
    let form = sign_wizard_form("files", files, placement, signature_image)?
        .text("mode", "bulk_same_spot");
    let resp = client_request(Method::POST, "batch-sign/", None)
        .multipart(form)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    check_status(resp)
        .await?
        .json()
        .await
        .map_err(|e| e.to_string())
}

pub async fn fetch_batch_job(id: i64) -> Result<BatchJob, String> {
    get_json(&format!("batch-jobs/{id}/"), None).await
}

pub async fn fetch_batch_zip(id: i64) -> Result<Vec<u8>, String> {
    get_bytes(&format!("batch-jobs/{id}/download/"), None).await
}

/// Check a printed QR code's proof: the uuid names the print record and
/// `sig` is the server-issued signature over it.
pub async fn verify_print(uuid: &Uuid, sig: &str) -> Result<VerifyResult, String> {
    let resp = client_request(Method::GET, &format!("prints/{uuid}/verify/"), None)
        .query(&[("sig", sig)])
        .send()
        .await
        .map_err(|e| e.to_string())?;
    check_status(resp)
        .await?
        .json()
        .await
        .map_err(|e| e.to_string())
}
