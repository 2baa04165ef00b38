//! Response interpretation.
//!
//! Turns the acquirer's XML reply into a [`TransactionResult`], or refuses
//! to. A payload that is missing required fields or fails digest verification
//! is an error, never a partially populated result: the caller must not guess
//! whether money moved.

use std::collections::BTreeMap;

use realex_core::{GatewayError, TransactionRequest, TransactionResult};

use crate::signing::{DigestAlgorithm, ResponseFields, Signer};
use crate::wire::ResponseXml;

const SUCCESS_CODE: &str = "00";

/// Parses and verifies acquirer responses.
#[derive(Debug, Clone)]
pub struct ResponseInterpreter {
    signer: Signer,
}

impl ResponseInterpreter {
    /// Create an interpreter that verifies digests with `signer`.
    #[must_use]
    pub fn new(signer: Signer) -> Self {
        Self { signer }
    }

    /// Parse a raw response to `request`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::MalformedResponse`] if the payload is not XML, lacks
    ///   `<result>` or `<message>`, lacks `<pasref>` on success, or echoes a
    ///   different order.
    /// - [`GatewayError::ResponseVerification`] if the digest does not match,
    ///   or an approval arrives unsigned.
    pub fn parse(
        &self,
        raw: &str,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, GatewayError> {
        let order = request.order_reference.as_str();

        if raw.trim().is_empty() {
            return Err(malformed(raw, order, "empty response body"));
        }

        let response: ResponseXml = quick_xml::de::from_str(raw)
            .map_err(|e| malformed(raw, order, &format!("invalid XML: {e}")))?;

        let code = required(response.result.as_deref())
            .ok_or_else(|| malformed(raw, order, "missing <result>"))?;
        let message = response
            .message
            .as_deref()
            .ok_or_else(|| malformed(raw, order, "missing <message>"))?;

        if let Some(echoed) = required(response.orderid.as_deref()) {
            if echoed != order {
                return Err(malformed(
                    raw,
                    order,
                    &format!("response is for order {echoed}"),
                ));
            }
        }

        let success = code == SUCCESS_CODE;
        let pasref = required(response.pasref.as_deref());
        if success && pasref.is_none() {
            return Err(malformed(raw, order, "approved response has no <pasref>"));
        }

        self.verify(&response, code, message, success)?;

        let result = TransactionResult::new(
            request.kind,
            code,
            message,
            request.order_reference.clone(),
            pasref.map(str::to_string),
            required(response.authcode.as_deref()).map(str::to_string),
            diagnostics(&response),
        );

        tracing::debug!(
            order_reference = %order,
            result = %result.code,
            class = ?result.class(),
            "Parsed acquirer response"
        );

        Ok(result)
    }

    fn verify(
        &self,
        response: &ResponseXml,
        code: &str,
        message: &str,
        success: bool,
    ) -> Result<(), GatewayError> {
        let received = match self.signer.algorithm() {
            DigestAlgorithm::Sha1 => response.sha1hash.as_deref(),
            DigestAlgorithm::Md5 => response.md5hash.as_deref(),
        };

        let Some(received) = required(received) else {
            if success {
                tracing::warn!(
                    order_reference = ?response.orderid,
                    "Approved response carries no digest"
                );
                return Err(GatewayError::ResponseVerification(
                    "approved response is unsigned".into(),
                ));
            }
            // Requests rejected before authentication come back unsigned.
            tracing::debug!(result = %code, "Unsigned failure response accepted");
            return Ok(());
        };

        let fields = ResponseFields {
            timestamp: response.timestamp.as_deref().unwrap_or_default(),
            merchant_id: response.merchantid.as_deref().unwrap_or_default(),
            order_id: response.orderid.as_deref().unwrap_or_default(),
            result: code,
            message,
            pasref: response.pasref.as_deref().unwrap_or_default(),
            authcode: response.authcode.as_deref().unwrap_or_default(),
        };

        self.signer.verify_response(&fields, received).map_err(|e| {
            tracing::warn!(
                order_reference = %fields.order_id,
                result = %code,
                "Response digest mismatch"
            );
            e
        })
    }
}

/// Treat empty elements like missing ones.
fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn malformed(raw: &str, order: &str, reason: &str) -> GatewayError {
    tracing::warn!(
        order_reference = %order,
        reason = %reason,
        payload = %raw,
        "Malformed acquirer response; reconcile manually"
    );
    GatewayError::malformed(reason)
}

fn diagnostics(response: &ResponseXml) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut put = |key: &str, value: Option<&str>| {
        if let Some(v) = required(value) {
            fields.insert(key.to_string(), v.to_string());
        }
    };

    put("account", response.account.as_deref());
    put("cvnresult", response.cvnresult.as_deref());
    put("avspostcoderesponse", response.avspostcoderesponse.as_deref());
    put("avsaddressresponse", response.avsaddressresponse.as_deref());
    put("batchid", response.batchid.as_deref());
    put("timetaken", response.timetaken.as_deref());
    put("authtimetaken", response.authtimetaken.as_deref());

    if let Some(issuer) = &response.cardissuer {
        put("cardissuer.bank", issuer.bank.as_deref());
        put("cardissuer.country", issuer.country.as_deref());
        put("cardissuer.countrycode", issuer.countrycode.as_deref());
        put("cardissuer.region", issuer.region.as_deref());
    }

    if let Some(tss) = &response.tss {
        put("tss.result", tss.result.as_deref());
        for check in &tss.check {
            put(&format!("tss.check.{}", check.id), Some(check.value.as_str()));
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use realex_core::{Credentials, OrderReference, PriorReference, TransactionKind};

    const TS: &str = "20240101120000";

    fn signer() -> Signer {
        Signer::new(
            Arc::new(Credentials::new("X", "Y").unwrap()),
            DigestAlgorithm::Sha1,
        )
    }

    fn interpreter() -> ResponseInterpreter {
        ResponseInterpreter::new(signer())
    }

    fn request(kind: TransactionKind) -> TransactionRequest {
        TransactionRequest {
            kind,
            order_reference: OrderReference::new("ORD1").unwrap(),
            amount: Some(500),
            currency: Some("GBP".into()),
            card: None,
            prior: None,
            timestamp: TS.into(),
            comments: Vec::new(),
            fraud: None,
        }
    }

    fn hash(result: &str, message: &str, pasref: &str, authcode: &str) -> String {
        let joined = format!("{TS}.X.ORD1.{result}.{message}.{pasref}.{authcode}");
        let inner = DigestAlgorithm::Sha1.hex(&joined);
        DigestAlgorithm::Sha1.hex(&format!("{inner}.Y"))
    }

    fn signed_response(result: &str, message: &str, pasref: &str, authcode: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<response timestamp="{TS}">
  <merchantid>X</merchantid>
  <account>internet</account>
  <orderid>ORD1</orderid>
  <result>{result}</result>
  <authcode>{authcode}</authcode>
  <message>{message}</message>
  <pasref>{pasref}</pasref>
  <cvnresult>M</cvnresult>
  <batchid>-1</batchid>
  <cardissuer>
    <bank>AIB BANK</bank>
    <country>IRELAND</country>
    <countrycode>IE</countrycode>
    <region>EUR</region>
  </cardissuer>
  <tss>
    <result>89</result>
    <check id="1000">9</check>
    <check id="1001">9</check>
  </tss>
  <timetaken>3</timetaken>
  <authtimetaken>2</authtimetaken>
  <sha1hash>{hash}</sha1hash>
</response>"#,
            hash = hash(result, message, pasref, authcode)
        )
    }

    #[test]
    fn success_maps_to_authorization_reference() {
        let raw = signed_response("00", "[ test system ] Authorised", "PAS1", "AUTH1");
        let result = interpreter()
            .parse(&raw, &request(TransactionKind::Authorize))
            .unwrap();

        assert!(result.success);
        assert_eq!(result.code, "00");
        assert_eq!(result.message, "[ test system ] Authorised");
        assert_eq!(result.authorization_reference, "ORD1;PAS1;AUTH1");
        assert_eq!(
            result.prior_reference(),
            Some(PriorReference::new(
                OrderReference::new("ORD1").unwrap(),
                "PAS1",
                "AUTH1"
            ))
        );
    }

    #[test]
    fn collects_diagnostic_fields() {
        let raw = signed_response("00", "Authorised", "PAS1", "AUTH1");
        let result = interpreter()
            .parse(&raw, &request(TransactionKind::Authorize))
            .unwrap();

        assert_eq!(result.raw_fields["cardissuer.bank"], "AIB BANK");
        assert_eq!(result.raw_fields["cardissuer.countrycode"], "IE");
        assert_eq!(result.raw_fields["tss.result"], "89");
        assert_eq!(result.raw_fields["tss.check.1001"], "9");
        assert_eq!(result.raw_fields["cvnresult"], "M");
        assert_eq!(result.raw_fields["account"], "internet");
    }

    #[test]
    fn decline_preserves_message_verbatim() {
        let raw = signed_response("101", "DECLINED BY BANK", "PAS2", "");
        let result = interpreter()
            .parse(&raw, &request(TransactionKind::Authorize))
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.code, "101");
        assert_eq!(result.message, "DECLINED BY BANK");
        assert_eq!(result.authorization_code, None);
    }

    #[test]
    fn unsigned_failure_is_accepted() {
        let raw = r#"<response timestamp="20240101120000">
            <result>508</result>
            <message>Invalid card number</message>
        </response>"#;
        let result = interpreter()
            .parse(raw, &request(TransactionKind::Authorize))
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "Invalid card number");
        assert_eq!(result.authorization_reference, "");
    }

    #[test]
    fn missing_result_is_malformed() {
        let raw = r#"<response timestamp="20240101120000">
            <orderid>ORD1</orderid>
            <message>Authorised</message>
            <pasref>PAS1</pasref>
        </response>"#;
        let err = interpreter()
            .parse(raw, &request(TransactionKind::Authorize))
            .unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse { .. }));
    }

    #[test]
    fn missing_message_is_malformed() {
        let raw = r"<response><result>00</result><pasref>PAS1</pasref></response>";
        let err = interpreter()
            .parse(raw, &request(TransactionKind::Authorize))
            .unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse { .. }));
    }

    #[test]
    fn garbage_and_empty_payloads_are_malformed() {
        for raw in ["", "   ", "<response><result>00</res", "<html><body>Bad Gateway</body></html>"] {
            let err = interpreter()
                .parse(raw, &request(TransactionKind::Authorize))
                .unwrap_err();
            assert!(
                matches!(err, GatewayError::MalformedResponse { .. }),
                "{raw:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn approval_without_pasref_is_malformed() {
        let raw = signed_response("00", "Authorised", "", "AUTH1");
        let err = interpreter()
            .parse(&raw, &request(TransactionKind::Authorize))
            .unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse { .. }));
    }

    #[test]
    fn response_for_other_order_is_malformed() {
        let raw = signed_response("00", "Authorised", "PAS1", "AUTH1");
        let mut req = request(TransactionKind::Authorize);
        req.order_reference = OrderReference::new("ORD2").unwrap();
        let err = interpreter().parse(&raw, &req).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse { .. }));
    }

    #[test]
    fn tampered_approval_fails_verification() {
        let raw = signed_response("101", "Declined", "PAS1", "AUTH1")
            .replace("<result>101</result>", "<result>00</result>");
        let err = interpreter()
            .parse(&raw, &request(TransactionKind::Authorize))
            .unwrap_err();
        assert!(matches!(err, GatewayError::ResponseVerification(_)));
    }

    #[test]
    fn unsigned_approval_fails_verification() {
        let raw = r#"<response timestamp="20240101120000">
            <orderid>ORD1</orderid>
            <result>00</result>
            <message>Authorised</message>
            <pasref>PAS1</pasref>
            <authcode>AUTH1</authcode>
        </response>"#;
        let err = interpreter()
            .parse(raw, &request(TransactionKind::Authorize))
            .unwrap_err();
        assert!(matches!(err, GatewayError::ResponseVerification(_)));
    }

    #[test]
    fn result_kind_follows_request() {
        let raw = signed_response("00", "Settled Successfully", "PAS9", "");
        let result = interpreter()
            .parse(&raw, &request(TransactionKind::Capture))
            .unwrap();
        assert_eq!(result.kind, TransactionKind::Capture);
        assert_eq!(result.authorization_reference, "ORD1;PAS9;");
    }
}
