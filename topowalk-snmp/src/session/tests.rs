use super::*;
use crate::testing::{MemoryConnector, MemoryDevice};
use crate::table::NO_SUCH_OBJECT;
use topowalk_core::{AuthProtocol, PrivProtocol, UsmCredential};

const IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

fn device() -> MemoryDevice {
    let mut device = MemoryDevice::new()
        .community("private")
        .user("ops")
        .set("1.3.6.1.2.1.1.5.0", "core1.example.net")
        .set("1.3.6.1.2.1.4.1.0", NO_SUCH_OBJECT)
        .set("1.3.6.1.2.1.31.1.1.1.2.1", "after-ifname");
    for i in 1..=60u32 {
        device = device.set(&format!("1.3.6.1.2.1.31.1.1.1.1.{}", i), format!("Gi0/{}", i).as_str());
    }
    device
}

fn v3(username: &str) -> Credential {
    Credential::V3(UsmCredential {
        username: username.to_string(),
        auth_protocol: AuthProtocol::Sha,
        auth_key: "k".into(),
        priv_protocol: PrivProtocol::Aes128,
        priv_key: "p".into(),
    })
}

#[tokio::test]
async fn test_open_picks_first_working_credential() {
    let connector = MemoryConnector::new().with_device(IP, device());
    let credentials = [Credential::v2c("public"), v3("nobody"), Credential::v2c("private"), v3("ops")];

    let session = SnmpSession::open(&connector, IP, &credentials).await.unwrap();
    assert_eq!(session.credential(), &Credential::v2c("private"));
    assert_eq!(session.ip(), IP);
    assert_eq!(connector.connect_count(IP), 3);
}

#[tokio::test]
async fn test_open_v3() {
    let connector = MemoryConnector::new().with_device(IP, device());
    let session = SnmpSession::open(&connector, IP, &[v3("ops")]).await.unwrap();
    assert_eq!(session.get_text("1.3.6.1.2.1.1.5.0").await.as_deref(), Some("core1.example.net"));
}

#[tokio::test]
async fn test_open_unreachable() {
    let connector = MemoryConnector::new().with_device(IP, device());
    let result = SnmpSession::open(&connector, IP, &[Credential::v2c("public")]).await;
    assert!(matches!(result, Err(Error::Unreachable(ip)) if ip == "10.0.0.1"));

    let other = Ipv4Addr::new(10, 9, 9, 9);
    assert!(SnmpSession::open(&connector, other, &[Credential::v2c("private")])
        .await
        .is_err());
}

#[tokio::test]
async fn test_get_maps_sentinels_to_none() {
    let connector = MemoryConnector::new().with_device(IP, device());
    let session = SnmpSession::open(&connector, IP, &[Credential::v2c("private")]).await.unwrap();

    assert!(session.get("1.3.6.1.2.1.4.1.0").await.is_none());
    assert!(session.get("1.3.6.1.2.1.99.0").await.is_none());
}

#[tokio::test]
async fn test_bulk_walks_whole_subtree_only() {
    let connector = MemoryConnector::new().with_device(IP, device());
    let session = SnmpSession::open(&connector, IP, &[Credential::v2c("private")]).await.unwrap();

    // 60 rows need three GETBULK round trips and must stop before .2.1
    let table = session.bulk("1.3.6.1.2.1.31.1.1.1.1").await.unwrap();
    assert_eq!(table.len(), 60);
    assert_eq!(table.lookup_text("1.3.6.1.2.1.31.1.1.1.1.60").as_deref(), Some("Gi0/60"));
    assert!(table.lookup("1.3.6.1.2.1.31.1.1.1.2.1").is_none());

    let empty = session.bulk("1.3.6.1.4.1.9.9.23.1.2.1.1").await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_bulk_transport_error_is_none() {
    let connector = MemoryConnector::new().with_device(
        IP,
        device().fail_walks_under("1.3.6.1.2.1.31"),
    );
    let session = SnmpSession::open(&connector, IP, &[Credential::v2c("private")]).await.unwrap();
    assert!(session.bulk("1.3.6.1.2.1.31.1.1.1.1").await.is_none());
}

#[tokio::test]
async fn test_for_vlan_uses_indexed_community() {
    let connector = MemoryConnector::new().with_device(
        IP,
        device().set_vlan(30, "1.3.6.1.2.1.17.1.4.1.2.5", 10105i64),
    );
    let session = SnmpSession::open(&connector, IP, &[Credential::v2c("private")]).await.unwrap();

    let vlan = session.for_vlan(&connector, 30).await.unwrap();
    assert_eq!(vlan.credential(), &Credential::v2c("private@30"));
    assert_eq!(
        vlan.get("1.3.6.1.2.1.17.1.4.1.2.5").await,
        Some(SnmpValue::Integer(10105))
    );

    let v3_session = SnmpSession::open(&connector, IP, &[v3("ops")]).await.unwrap();
    let same = v3_session.for_vlan(&connector, 30).await.unwrap();
    assert_eq!(same.credential(), &v3("ops"));
}
