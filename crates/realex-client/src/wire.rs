//! XML wire structures for quick-xml.
//!
//! Field order matters: the acquirer validates requests against a schema, and
//! quick-xml writes struct fields in declaration order.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename = "request")]
pub(crate) struct RequestXml {
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub merchantid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    pub orderid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pasref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<AmountXml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardXml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refundhash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autosettle: Option<AutoSettleXml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<CommentsXml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tssinfo: Option<TssInfoXml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha1hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AmountXml {
    #[serde(rename = "@currency")]
    pub currency: String,
    #[serde(rename = "$text")]
    pub value: i64,
}

#[derive(Serialize)]
pub(crate) struct CardXml {
    pub number: String,
    pub expdate: String,
    pub chname: String,
    #[serde(rename = "type")]
    pub brand: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issueno: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvn: Option<CvnXml>,
}

impl std::fmt::Debug for CardXml {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardXml")
            .field("brand", &self.brand)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
pub(crate) struct CvnXml {
    pub number: String,
    pub presind: u8,
}

#[derive(Debug, Serialize)]
pub(crate) struct AutoSettleXml {
    #[serde(rename = "@flag")]
    pub flag: u8,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentsXml {
    pub comment: Vec<CommentXml>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentXml {
    #[serde(rename = "@id")]
    pub id: usize,
    #[serde(rename = "$text")]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TssInfoXml {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custnum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prodid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub varref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custipaddress: Option<String>,
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename = "response")]
pub(crate) struct ResponseXml {
    #[serde(rename = "@timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub merchantid: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub orderid: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub authcode: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pasref: Option<String>,
    #[serde(default)]
    pub cvnresult: Option<String>,
    #[serde(default)]
    pub avspostcoderesponse: Option<String>,
    #[serde(default)]
    pub avsaddressresponse: Option<String>,
    #[serde(default)]
    pub batchid: Option<String>,
    #[serde(default)]
    pub timetaken: Option<String>,
    #[serde(default)]
    pub authtimetaken: Option<String>,
    #[serde(default)]
    pub cardissuer: Option<CardIssuerXml>,
    #[serde(default)]
    pub tss: Option<TssXml>,
    #[serde(default)]
    pub sha1hash: Option<String>,
    #[serde(default)]
    pub md5hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CardIssuerXml {
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub countrycode: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TssXml {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub check: Vec<TssCheckXml>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TssCheckXml {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "$text", default)]
    pub value: String,
}
