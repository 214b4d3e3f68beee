// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! A citizen's real estate: records, documents, and local taxes.

use clap::ValueEnum;
use reqwest::header::{HeaderValue, ACCEPT};
use serde_json::{json, Map, Value};

use crate::{
    error::{Error, Result},
    request::{Decoding, Request},
    session::Role,
};

use super::{segment, Access, Executor, FromPayload, Portal};

const CITIZEN: Access = Access::Role(Role::Citizen);

fn property_path(id: &str, rest: &str) -> Result<String> {
    Ok(format!("/api/properties/{}{}", segment(id, "property id")?, rest))
}

pub struct ListProperties;

impl From<ListProperties> for Request {
    fn from(_: ListProperties) -> Self {
        Self::get("/api/properties")
    }
}

impl Executor for ListProperties {
    type Response = Value;
    const ACCESS: Access = CITIZEN;
}

macro_rules! property_resource {
    ($(#[$attr:meta])* $name:ident, $rest:literal, $response:ty $(, $accept:literal)?) => {
        $(#[$attr])*
        pub struct $name {
            pub id: String,
        }

        impl TryFrom<$name> for Request {
            type Error = Error;

            fn try_from(value: $name) -> Result<Self, Self::Error> {
                #[allow(unused_mut)]
                let mut req = Self::get(property_path(&value.id, $rest)?);
                $(
                    req = req
                        .with_header(ACCEPT, HeaderValue::from_static($accept))
                        .decode_as(Decoding::Binary);
                )?
                Ok(req)
            }
        }

        impl Executor for $name {
            type Response = $response;
            const ACCESS: Access = CITIZEN;
        }
    };
}

property_resource!(GetProperty, "", Value);
property_resource!(TaxAssessment, "/tax-assessment", Value);
property_resource!(
    /// Metadata about the cadastral sketch, if one has been issued.
    SketchMeta,
    "/sketch",
    Value
);
property_resource!(SketchPdf, "/sketch/pdf", Vec<u8>, "application/pdf");
property_resource!(
    /// The document proving ownership, in whatever format it was uploaded.
    OwnershipDoc,
    "/ownership-doc",
    Vec<u8>,
    "*/*"
);

/// Checks for the sketch PDF without downloading it.
struct SketchPdfProbe {
    id: String,
}

impl TryFrom<SketchPdfProbe> for Request {
    type Error = Error;

    fn try_from(value: SketchPdfProbe) -> Result<Self, Self::Error> {
        Ok(Self::head(property_path(&value.id, "/sketch/pdf")?).decode_as(Decoding::Text))
    }
}

impl Executor for SketchPdfProbe {
    type Response = String;
    const ACCESS: Access = CITIZEN;
}

/// Fetches the sketch in any format, for backends that refuse `HEAD`.
struct SketchAnyFormat {
    id: String,
}

impl TryFrom<SketchAnyFormat> for Request {
    type Error = Error;

    fn try_from(value: SketchAnyFormat) -> Result<Self, Self::Error> {
        Ok(Self::get(property_path(&value.id, "/sketch/pdf")?)
            .with_header(ACCEPT, HeaderValue::from_static("*/*"))
            .decode_as(Decoding::Binary))
    }
}

impl Executor for SketchAnyFormat {
    type Response = Vec<u8>;
    const ACCESS: Access = CITIZEN;
}

/// Whether a metadata document says anything: null, `false`, zero and the
/// empty string all mean no.
fn is_present(value: &Value) -> bool {
    match *value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(ref n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(ref s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_missing(err: &Error) -> bool {
    err.status_code() == Some(404)
}

fn is_unsupported(err: &Error) -> bool {
    matches!(err.status_code(), Some(404 | 405))
}

pub async fn has_tax_assessment(portal: &Portal, id: &str) -> Result<bool> {
    match (TaxAssessment { id: id.to_owned() }).execute(portal).await {
        Ok(_) => Ok(true),
        Err(e) if is_missing(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Whether a sketch exists. Falls back to probing the PDF itself when the
/// backend has no metadata endpoint for this property.
pub async fn has_sketch(portal: &Portal, id: &str) -> Result<bool> {
    match (SketchMeta { id: id.to_owned() }).execute(portal).await {
        Ok(meta) => return Ok(is_present(&meta)),
        Err(e) if is_unsupported(&e) => {}
        Err(e) => return Err(e),
    }

    match (SketchPdfProbe { id: id.to_owned() }).execute(portal).await {
        Ok(_) => Ok(true),
        Err(e) if is_missing(&e) => Ok(false),
        Err(e) if e.status_code() == Some(405) => {
            match (SketchAnyFormat { id: id.to_owned() }).execute(portal).await {
                Ok(_) => Ok(true),
                Err(e) if is_missing(&e) => Ok(false),
                Err(e) => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

/// The yearly debts on a property, with each charge grouped into a
/// `{amount, isPaid, paidAt}` object whether the backend sent it flat or
/// nested.
#[derive(Clone, Debug, PartialEq)]
pub struct DebtSchedule(pub Value);

fn charge(debt: &Map<String, Value>, prefix: &str) -> Value {
    let nested = debt.get(prefix);
    let pick = |flat: &str, field: &str| {
        debt.get(&format!("{prefix}{flat}"))
            .filter(|v| !v.is_null())
            .or_else(|| nested.and_then(|n| n.get(field)).filter(|v| !v.is_null()))
            .cloned()
    };

    json!({
        "amount": pick("Amount", "amount").unwrap_or(Value::Null),
        "isPaid": pick("IsPaid", "isPaid").unwrap_or(Value::Bool(false)),
        "paidAt": pick("PaidAt", "paidAt").unwrap_or(Value::Null),
    })
}

fn normalize_debt(debt: Value) -> Value {
    match debt {
        Value::Object(mut fields) => {
            let yearly_tax = charge(&fields, "yearlyTax");
            let trash_fee = charge(&fields, "trashFee");
            let _ = fields.insert("yearlyTax".to_owned(), yearly_tax);
            let _ = fields.insert("trashFee".to_owned(), trash_fee);
            Value::Object(fields)
        }
        other => other,
    }
}

impl FromPayload for DebtSchedule {
    fn from_payload(payload: crate::request::Payload) -> Result<Self> {
        Ok(Self(match payload.into_json() {
            Value::Array(debts) => Value::Array(debts.into_iter().map(normalize_debt).collect()),
            other => other,
        }))
    }
}

pub struct Debts {
    pub id: String,
}

impl TryFrom<Debts> for Request {
    type Error = Error;

    fn try_from(value: Debts) -> Result<Self, Self::Error> {
        Ok(Self::get(property_path(&value.id, "/debts")?))
    }
}

impl Executor for Debts {
    type Response = DebtSchedule;
    const ACCESS: Access = CITIZEN;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DebtKind {
    YearlyTax,
    TrashFee,
}

impl DebtKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::YearlyTax => "YEARLY_TAX",
            Self::TrashFee => "TRASH_FEE",
        }
    }
}

/// Pays one year's charge. The backend answers with a short confirmation
/// text.
pub struct PayDebt {
    pub id: String,
    pub year: u16,
    pub kind: DebtKind,
}

impl TryFrom<PayDebt> for Request {
    type Error = Error;

    fn try_from(value: PayDebt) -> Result<Self, Self::Error> {
        let rest = format!("/debts/{}/pay", value.year);
        Ok(Self::patch(property_path(&value.id, &rest)?)
            .with_query("kind", value.kind.as_str())
            .decode_as(Decoding::Text))
    }
}

impl Executor for PayDebt {
    type Response = String;
    const ACCESS: Access = CITIZEN;
}

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};

    use super::*;
    use crate::{
        api::testing,
        error::Kind,
        transport::{double::Scripted, Inbound},
    };

    #[tokio::test]
    async fn flat_and_nested_charges_are_normalized() {
        let raw = json!([
            {
                "year": 2024,
                "yearlyTaxAmount": 120.5,
                "yearlyTaxIsPaid": true,
                "yearlyTaxPaidAt": "2024-03-01",
                "trashFee": {"amount": 80, "isPaid": false}
            },
            {"year": 2023}
        ]);
        let (portal, transport) = testing::logged_in(
            Scripted::replying(Inbound::json(StatusCode::OK, &raw)),
            Role::Citizen,
        )
        .await;

        let DebtSchedule(debts) = Debts { id: "9".to_owned() }
            .execute(&portal)
            .await
            .unwrap();
        assert_eq!(
            debts[0]["yearlyTax"],
            json!({"amount": 120.5, "isPaid": true, "paidAt": "2024-03-01"})
        );
        assert_eq!(
            debts[0]["trashFee"],
            json!({"amount": 80, "isPaid": false, "paidAt": null})
        );
        assert_eq!(debts[0]["yearlyTaxAmount"], json!(120.5));
        assert_eq!(
            debts[1]["yearlyTax"],
            json!({"amount": null, "isPaid": false, "paidAt": null})
        );
        assert_eq!(transport.requests()[0].url.path(), "/api/properties/9/debts");
    }

    #[tokio::test]
    async fn non_array_debts_pass_through() {
        let (portal, _) = testing::logged_in(
            Scripted::replying(Inbound::json(StatusCode::OK, &json!({"total": 0}))),
            Role::Citizen,
        )
        .await;
        let schedule = Debts { id: "9".to_owned() }.execute(&portal).await.unwrap();
        assert_eq!(schedule, DebtSchedule(json!({"total": 0})));
    }

    #[tokio::test]
    async fn paying_a_debt_patches_with_the_kind() {
        let (portal, transport) = testing::logged_in(
            Scripted::replying(Inbound::new(StatusCode::OK).with_body("text/plain", "OK")),
            Role::Citizen,
        )
        .await;

        let confirmation = PayDebt {
            id: "9".to_owned(),
            year: 2024,
            kind: DebtKind::TrashFee,
        }
        .execute(&portal)
        .await
        .unwrap();
        assert_eq!(confirmation, "OK");

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::PATCH);
        assert_eq!(
            sent.url.as_str(),
            "http://backend.test/api/properties/9/debts/2024/pay?kind=TRASH_FEE"
        );
    }

    #[tokio::test]
    async fn documents_are_downloaded_as_bytes() {
        let (portal, transport) = testing::logged_in(
            Scripted::replying(
                Inbound::new(StatusCode::OK).with_body("application/pdf", b"%PDF-1.7".to_vec()),
            ),
            Role::Citizen,
        )
        .await;

        let pdf = SketchPdf { id: "9".to_owned() }.execute(&portal).await.unwrap();
        assert_eq!(pdf, b"%PDF-1.7".to_vec());
        let _ = OwnershipDoc { id: "9".to_owned() }.execute(&portal).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].headers.get(ACCEPT).unwrap(), "application/pdf");
        assert_eq!(requests[1].url.path(), "/api/properties/9/ownership-doc");
        assert_eq!(requests[1].headers.get(ACCEPT).unwrap(), "*/*");
    }

    #[tokio::test]
    async fn missing_tax_assessment_is_false() {
        let (portal, _) = testing::logged_in(
            Scripted::replying(Inbound::new(StatusCode::NOT_FOUND)),
            Role::Citizen,
        )
        .await;
        assert!(!has_tax_assessment(&portal, "9").await.unwrap());

        let (portal, _) = testing::logged_in(
            Scripted::replying(Inbound::new(StatusCode::INTERNAL_SERVER_ERROR)),
            Role::Citizen,
        )
        .await;
        assert_eq!(
            has_tax_assessment(&portal, "9").await.unwrap_err().kind(),
            Kind::Http(500)
        );
    }

    #[tokio::test]
    async fn sketch_falls_back_to_probing_the_pdf() {
        let (portal, transport) = testing::logged_in(
            Scripted::new(|req| {
                Ok(if req.method == Method::HEAD {
                    Inbound::new(StatusCode::OK)
                } else {
                    Inbound::new(StatusCode::METHOD_NOT_ALLOWED)
                })
            }),
            Role::Citizen,
        )
        .await;

        assert!(has_sketch(&portal, "9").await.unwrap());
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, Method::HEAD);
        assert_eq!(requests[1].url.path(), "/api/properties/9/sketch/pdf");
    }

    #[tokio::test]
    async fn empty_sketch_metadata_means_no_sketch() {
        for response in [
            Inbound::new(StatusCode::OK),
            Inbound::json(StatusCode::OK, &json!(false)),
            Inbound::json(StatusCode::OK, &json!(0)),
            Inbound::json(StatusCode::OK, &json!("")),
        ] {
            let (portal, transport) =
                testing::logged_in(Scripted::replying(response), Role::Citizen).await;
            assert!(!has_sketch(&portal, "9").await.unwrap());
            assert_eq!(transport.requests().len(), 1);
        }

        let (portal, _) = testing::logged_in(
            Scripted::replying(Inbound::json(StatusCode::OK, &json!({"issuedAt": "2024-01-01"}))),
            Role::Citizen,
        )
        .await;
        assert!(has_sketch(&portal, "9").await.unwrap());
    }

    #[tokio::test]
    async fn sketch_is_fetched_in_any_format_when_head_is_refused() {
        let (portal, transport) = testing::logged_in(
            Scripted::new(|req| {
                Ok(if req.method == Method::GET && req.url.path().ends_with("/pdf") {
                    Inbound::new(StatusCode::OK).with_body("image/png", vec![1])
                } else {
                    Inbound::new(StatusCode::METHOD_NOT_ALLOWED)
                })
            }),
            Role::Citizen,
        )
        .await;

        assert!(has_sketch(&portal, "9").await.unwrap());
        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].method, Method::HEAD);
        assert_eq!(requests[2].method, Method::GET);
        assert_eq!(requests[2].headers.get(ACCEPT).unwrap(), "*/*");
    }

    #[tokio::test]
    async fn sketch_without_metadata_or_pdf_is_false() {
        let (portal, _) = testing::logged_in(
            Scripted::replying(Inbound::new(StatusCode::NOT_FOUND)),
            Role::Citizen,
        )
        .await;
        assert!(!has_sketch(&portal, "9").await.unwrap());
    }

    #[tokio::test]
    async fn administrators_cannot_see_properties() {
        let (portal, transport) =
            testing::logged_in(Scripted::echo(), Role::Administrator).await;
        assert_eq!(
            ListProperties.execute(&portal).await.unwrap_err().kind(),
            Kind::ForbiddenRole
        );
        assert!(transport.requests().is_empty());
    }
}
