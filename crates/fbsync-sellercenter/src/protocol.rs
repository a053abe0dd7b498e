//! Wire formats for the Seller Center product update call.
//!
//! [`ProtocolVariant`] is chosen once, at client construction. Each variant
//! fixes which parameters are signed, how they are canonicalized, how the
//! timestamp is written and how the body is encoded. The variants are not
//! interchangeable on the wire.

use chrono::{DateTime, SecondsFormat, Utc};
use fbsync_core::{ProductSyncRecord, ProtocolVariant};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::SellerCenterError;
use crate::params::RequestParameters;
use crate::signer::{canonical_string, encode_component, Canonicalization};

/// Suffix used for the UTC `Timestamp` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// `2026-10-15T12:00:00Z`
    Zulu,
    /// `2026-10-15T12:00:00+00:00`
    Offset,
}

impl TimestampStyle {
    /// Formats `ts` at second precision.
    #[must_use]
    pub fn format(self, ts: DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Secs, self == TimestampStyle::Zulu)
    }
}

/// Encoded body plus the headers that describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub content_type: &'static str,
    pub accept: &'static str,
    pub bytes: Vec<u8>,
}

/// The per-variant capabilities the client needs.
pub trait WireProtocol {
    fn canonicalization(&self) -> Canonicalization;

    fn timestamp_style(&self) -> TimestampStyle;

    /// Value of the `Format` parameter.
    fn format_param(&self) -> &'static str;

    /// Whether SKU, name, price and quantity are part of the signed parameters.
    fn signs_product_fields(&self) -> bool;

    /// The string the signature is computed over.
    fn canonicalize(&self, params: &RequestParameters) -> String {
        canonical_string(params, self.canonicalization())
    }

    /// Encodes the request body for `record`. `params` must already be signed.
    ///
    /// # Errors
    ///
    /// Returns [`SellerCenterError::Encode`] if the body cannot be written.
    fn serialize_body(
        &self,
        record: &ProductSyncRecord,
        params: &RequestParameters,
        operator_code: &str,
    ) -> Result<RequestBody, SellerCenterError>;

    /// Query string to append to the endpoint URL, if the variant uses one.
    fn query_string(&self, params: &RequestParameters) -> Option<String>;
}

impl WireProtocol for ProtocolVariant {
    fn canonicalization(&self) -> Canonicalization {
        match self {
            ProtocolVariant::Xml | ProtocolVariant::Json => Canonicalization::PercentEncoded,
            ProtocolVariant::Form => Canonicalization::Concatenated,
        }
    }

    fn timestamp_style(&self) -> TimestampStyle {
        match self {
            ProtocolVariant::Xml => TimestampStyle::Zulu,
            ProtocolVariant::Form | ProtocolVariant::Json => TimestampStyle::Offset,
        }
    }

    fn format_param(&self) -> &'static str {
        match self {
            ProtocolVariant::Xml => "XML",
            ProtocolVariant::Form | ProtocolVariant::Json => "JSON",
        }
    }

    fn signs_product_fields(&self) -> bool {
        !matches!(self, ProtocolVariant::Xml)
    }

    fn serialize_body(
        &self,
        record: &ProductSyncRecord,
        params: &RequestParameters,
        operator_code: &str,
    ) -> Result<RequestBody, SellerCenterError> {
        match self {
            ProtocolVariant::Xml => Ok(RequestBody {
                content_type: "application/xml",
                accept: "application/xml",
                bytes: product_update_xml(record, operator_code)?,
            }),
            ProtocolVariant::Form => Ok(RequestBody {
                content_type: "application/x-www-form-urlencoded",
                accept: "application/json",
                bytes: encode_pairs(params).into_bytes(),
            }),
            ProtocolVariant::Json => {
                let object: serde_json::Map<String, serde_json::Value> = params
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                    .collect();
                let bytes = serde_json::to_vec(&object)
                    .map_err(|e| SellerCenterError::Encode(e.to_string()))?;
                Ok(RequestBody {
                    content_type: "application/json",
                    accept: "application/json",
                    bytes,
                })
            }
        }
    }

    fn query_string(&self, params: &RequestParameters) -> Option<String> {
        match self {
            ProtocolVariant::Xml => Some(encode_pairs(params)),
            ProtocolVariant::Form | ProtocolVariant::Json => None,
        }
    }
}

/// Builds the unsigned parameter set for one product update.
#[must_use]
pub fn build_params(
    protocol: ProtocolVariant,
    action: &str,
    version: &str,
    user: &str,
    record: &ProductSyncRecord,
    now: DateTime<Utc>,
) -> RequestParameters {
    let mut params = RequestParameters::new();
    params.insert("Action", action);
    params.insert("UserID", user);
    params.insert("Timestamp", protocol.timestamp_style().format(now));
    params.insert("Version", version);
    params.insert("Format", protocol.format_param());

    if protocol.signs_product_fields() {
        params.insert("SKU", record.sku.as_str());
        params.insert("Name", record.name.as_str());
        params.insert("Price", record.price_string());
        params.insert("Quantity", record.quantity.to_string());
    }

    params
}

/// `k=v&k=v` in parameter order, keys and values percent-encoded.
fn encode_pairs(params: &RequestParameters) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn product_update_xml(
    record: &ProductSyncRecord,
    operator_code: &str,
) -> Result<Vec<u8>, SellerCenterError> {
    let mut writer = Writer::new(Vec::new());
    let stock = record.quantity.to_string();
    let price = record.price_string();

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write(&mut writer, Event::Start(BytesStart::new("Request")))?;
    write(&mut writer, Event::Start(BytesStart::new("Product")))?;
    text_element(&mut writer, "SellerSku", &record.sku)?;
    text_element(&mut writer, "Name", &record.name)?;
    text_element(&mut writer, "Price", &price)?;
    write(&mut writer, Event::Start(BytesStart::new("BusinessUnits")))?;
    write(&mut writer, Event::Start(BytesStart::new("BusinessUnit")))?;
    text_element(&mut writer, "OperatorCode", operator_code)?;
    text_element(&mut writer, "Stock", &stock)?;
    write(&mut writer, Event::End(BytesEnd::new("BusinessUnit")))?;
    write(&mut writer, Event::End(BytesEnd::new("BusinessUnits")))?;
    write(&mut writer, Event::End(BytesEnd::new("Product")))?;
    write(&mut writer, Event::End(BytesEnd::new("Request")))?;

    Ok(writer.into_inner())
}

fn text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &str,
) -> Result<(), SellerCenterError> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(value)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), SellerCenterError> {
    writer
        .write_event(event)
        .map_err(|e| SellerCenterError::Encode(e.to_string()))
}

/// Pulls the human-readable `ErrorMessage` out of a Seller Center error
/// response, in either its XML or JSON form.
#[must_use]
pub fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
        return value
            .pointer("/ErrorResponse/Head/ErrorMessage")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
    }
    if trimmed.starts_with('<') {
        return xml_error_message(trimmed);
    }
    None
}

fn xml_error_message(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut in_message = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                in_message = e.name().as_ref() == b"ErrorMessage";
            }
            Ok(Event::Text(e)) if in_message => {
                return e.unescape().ok().map(|t| t.into_owned());
            }
            Ok(Event::End(_)) => in_message = false,
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}
