//! Common test utilities for gateway integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use realex_client::{
    CardBrand, CardDetails, Credentials, DigestAlgorithm, GatewayConfig, RealexGateway,
};
use wiremock::MockServer;

/// Merchant id used by every stub.
pub const MERCHANT_ID: &str = "thestore";
/// Shared secret used by every stub.
pub const SHARED_SECRET: &str = "mysecret";
/// Timestamp echoed in stub responses.
pub const RESPONSE_TIMESTAMP: &str = "20240101120000";

/// Test harness pairing a gateway with the mock acquirer it talks to.
pub struct TestHarness {
    /// Mock acquirer endpoint.
    pub server: MockServer,
    /// Gateway pointed at `server`.
    pub gateway: RealexGateway,
}

impl TestHarness {
    /// Harness with default configuration.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Harness with configuration tweaks applied before the gateway is built.
    pub async fn with_config(tweak: impl FnOnce(&mut GatewayConfig)) -> Self {
        let server = MockServer::start().await;

        let credentials = Credentials::new(MERCHANT_ID, SHARED_SECRET)
            .expect("valid credentials")
            .with_account("internet")
            .with_rebate_secret("rebatepw");
        let mut config = GatewayConfig::new(credentials);
        config.endpoint = Some(server.uri());
        tweak(&mut config);

        let gateway = RealexGateway::new(config).expect("Failed to create gateway");
        Self { server, gateway }
    }

    /// Number of requests the mock acquirer has received.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

/// A valid Visa test card.
pub fn visa() -> CardDetails {
    CardDetails::new("4263971921001307", 4, 2030, "Steve Smith", CardBrand::Visa)
        .with_verification_value("123")
}

/// Builder for signed stub responses.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub order_id: String,
    pub result: String,
    pub message: String,
    pub pasref: String,
    pub authcode: String,
    pub extra: String,
    pub signed: bool,
}

impl StubResponse {
    /// Approval for `order_id`.
    pub fn approved(order_id: &str, pasref: &str, authcode: &str) -> Self {
        Self {
            order_id: order_id.into(),
            result: "00".into(),
            message: "[ test system ] Authorised".into(),
            pasref: pasref.into(),
            authcode: authcode.into(),
            extra: String::new(),
            signed: true,
        }
    }

    /// Failure with the given code and message.
    pub fn failed(order_id: &str, result: &str, message: &str) -> Self {
        Self {
            order_id: order_id.into(),
            result: result.into(),
            message: message.into(),
            pasref: String::new(),
            authcode: String::new(),
            extra: String::new(),
            signed: true,
        }
    }

    /// Append raw XML inside `<response>`.
    pub fn extra(mut self, xml: &str) -> Self {
        self.extra.push_str(xml);
        self
    }

    /// Omit the digest.
    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    /// Digest the acquirer would send for these fields.
    pub fn digest(&self) -> String {
        let joined = [
            RESPONSE_TIMESTAMP,
            MERCHANT_ID,
            &self.order_id,
            &self.result,
            &self.message,
            &self.pasref,
            &self.authcode,
        ]
        .join(".");
        let inner = DigestAlgorithm::Sha1.hex(&joined);
        DigestAlgorithm::Sha1.hex(&format!("{inner}.{SHARED_SECRET}"))
    }

    /// Render with the correct digest (unless unsigned).
    pub fn xml(&self) -> String {
        let hash = if self.signed {
            format!("<sha1hash>{}</sha1hash>", self.digest())
        } else {
            String::new()
        };
        self.render(&hash)
    }

    /// Render with an arbitrary digest.
    pub fn xml_with_hash(&self, hash: &str) -> String {
        self.render(&format!("<sha1hash>{hash}</sha1hash>"))
    }

    fn render(&self, hash: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <response timestamp=\"{RESPONSE_TIMESTAMP}\">\
             <merchantid>{MERCHANT_ID}</merchantid>\
             <account>internet</account>\
             <orderid>{}</orderid>\
             <result>{}</result>\
             <authcode>{}</authcode>\
             <message>{}</message>\
             <pasref>{}</pasref>\
             {}\
             {hash}\
             </response>",
            self.order_id, self.result, self.authcode, self.message, self.pasref, self.extra
        )
    }
}
