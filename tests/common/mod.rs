//! WireMock-based Bond Bridge for end-to-end generator runs.

use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TOKEN: &str = "0123abcd";
pub const FAN_ID: &str = "aabbccdd";
pub const SHADE_ID: &str = "11223344";
pub const GROUP_ID: &str = "99887766";

pub struct MockBondBridge {
    pub server: MockServer,
}

impl MockBondBridge {
    /// Bridge with a ceiling fan, a shade and a fan group.
    pub async fn start() -> Self {
        let bridge = Self::empty().await;
        bridge.mount_defaults().await;
        bridge
    }

    /// Nothing mounted; every request answers 404.
    pub async fn empty() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub async fn get(&self, route: &str, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("BOND-Token", TOKEN))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn get_raw(&self, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_version(&self) {
        self.get(
            "/v2/sys/version",
            200,
            json!({"bondid": "ZZBL12345", "fw_ver": "v3.2.1", "_": "00000000"}),
        )
        .await;
    }

    async fn mount_defaults(&self) {
        self.mount_version().await;

        self.get(
            "/v2/devices",
            200,
            json!({"_": "7fc1e84b", FAN_ID: {"_": "9a2d"}, SHADE_ID: {"_": "41f0"}}),
        )
        .await;
        self.get(
            &format!("/v2/devices/{}", FAN_ID),
            200,
            json!({
                "name": "Bedroom Fan",
                "type": "CF",
                "location": "Bedroom",
                "actions": ["TurnOn", "TurnOff", "SetSpeed", "SetTimer"],
                "_": "9a2d"
            }),
        )
        .await;
        self.get(
            &format!("/v2/devices/{}/state", FAN_ID),
            200,
            json!({"_": "1d2e", "power": 1, "speed": 2}),
        )
        .await;
        self.get(
            &format!("/v2/devices/{}/properties", FAN_ID),
            200,
            json!({"max_speed": 6}),
        )
        .await;

        self.get(
            &format!("/v2/devices/{}", SHADE_ID),
            200,
            json!({
                "name": "Patio Shade",
                "type": "MS",
                "location": "Patio",
                "actions": ["Open", "Close", "Stop"]
            }),
        )
        .await;
        self.get(
            &format!("/v2/devices/{}/state", SHADE_ID),
            200,
            json!({"open": 0, "position": 100}),
        )
        .await;

        self.get(
            "/v2/groups",
            200,
            json!({"_": "55aa", GROUP_ID: {"_": "77bb"}}),
        )
        .await;
        self.get(
            &format!("/v2/groups/{}", GROUP_ID),
            200,
            json!({
                "name": "All Fans",
                "types": ["CF", "CF"],
                "devices": [FAN_ID],
                "actions": ["TurnOn", "TurnOff"]
            }),
        )
        .await;
        self.get(
            &format!("/v2/groups/{}/state", GROUP_ID),
            200,
            json!({"power": 0}),
        )
        .await;
    }
}
