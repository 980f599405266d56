//! OIDs read by the node query

// SNMPv2-MIB / IP-MIB
pub const SYS_NAME: &str = "1.3.6.1.2.1.1.5.0";
pub const IP_FORWARDING: &str = "1.3.6.1.2.1.4.1.0";

// IF-MIB
pub const IF_DESCR: &str = "1.3.6.1.2.1.2.2.1.2";
pub const IF_TYPE: &str = "1.3.6.1.2.1.2.2.1.3";
pub const IF_NAME: &str = "1.3.6.1.2.1.31.1.1.1.1";
pub const IF_TYPE_SOFTWARE_LOOPBACK: i64 = 24;

// ipAddrTable, indexed by address
pub const IP_ADDR_IF_INDEX: &str = "1.3.6.1.2.1.4.20.1.2";
pub const IP_ADDR_NETMASK: &str = "1.3.6.1.2.1.4.20.1.3";
/// First address component in an ipAddrTable OID
pub const IP_ADDR_INDEX_POS: usize = 10;

// CISCO-CDP-MIB cdpCacheTable: <base>.<column>.<ifIndex>.<instance>
pub const CDP_CACHE: &str = "1.3.6.1.4.1.9.9.23.1.2.1.1";
pub const CDP_ADDRESS: &str = "1.3.6.1.4.1.9.9.23.1.2.1.1.4";
pub const CDP_VERSION: &str = "1.3.6.1.4.1.9.9.23.1.2.1.1.5";
pub const CDP_DEVICE_ID: &str = "1.3.6.1.4.1.9.9.23.1.2.1.1.6";
pub const CDP_DEVICE_PORT: &str = "1.3.6.1.4.1.9.9.23.1.2.1.1.7";
pub const CDP_PLATFORM: &str = "1.3.6.1.4.1.9.9.23.1.2.1.1.8";
pub const CDP_IF_INDEX_POS: usize = 14;
pub const CDP_INSTANCE_POS: usize = 15;

// LLDP-MIB lldpRemTable: <base>.<column>.<timeMark>.<localPort>.<remIndex>
pub const LLDP_REMOTE: &str = "1.0.8802.1.1.2.1.4";
pub const LLDP_REM_CHASSIS_SUBTYPE: &str = "1.0.8802.1.1.2.1.4.1.1.4";
pub const LLDP_REM_CHASSIS_ID: &str = "1.0.8802.1.1.2.1.4.1.1.5";
pub const LLDP_REM_PORT_ID: &str = "1.0.8802.1.1.2.1.4.1.1.7";
pub const LLDP_REM_SYS_NAME: &str = "1.0.8802.1.1.2.1.4.1.1.9";
pub const LLDP_REM_SYS_DESC: &str = "1.0.8802.1.1.2.1.4.1.1.10";
/// lldpRemManAddrTable, address in the index after subtype and length
pub const LLDP_REM_MAN_ADDR: &str = "1.0.8802.1.1.2.1.4.2.1.5";
pub const LLDP_TIME_MARK_POS: usize = 11;
pub const LLDP_LOCAL_PORT_POS: usize = 12;
pub const LLDP_REM_INDEX_POS: usize = 13;
pub const LLDP_MAN_ADDR_SUBTYPE_POS: usize = 14;
pub const LLDP_MAN_ADDR_POS: usize = 16;

// CISCO-VTP-MIB vlanTrunkPortTable
pub const TRUNK_ALLOWED: &str = "1.3.6.1.4.1.9.9.46.1.6.1.1.4";
pub const TRUNK_NATIVE: &str = "1.3.6.1.4.1.9.9.46.1.6.1.1.5";
pub const TRUNK_STATUS: &str = "1.3.6.1.4.1.9.9.46.1.6.1.1.14";
pub const TRUNK_STATUS_TRUNKING: &str = "1";

// CISCO-VLAN-MEMBERSHIP-MIB vmVlan
pub const ACCESS_VLAN: &str = "1.3.6.1.4.1.9.9.68.1.2.2.1.2";

// IEEE8023-LAG-MIB dot3adAggPortSelectedAggID
pub const LAG_AGGREGATOR: &str = "1.2.840.10006.300.43.1.2.1.1.12";

// ENTITY-MIB entPhysicalTable: <base>.<column>.<index>
pub const ENT_CLASS: &str = "1.3.6.1.2.1.47.1.1.1.1.5";
pub const ENT_SOFTWARE: &str = "1.3.6.1.2.1.47.1.1.1.1.9";
pub const ENT_SERIAL: &str = "1.3.6.1.2.1.47.1.1.1.1.11";
pub const ENT_PLATFORM: &str = "1.3.6.1.2.1.47.1.1.1.1.13";
pub const ENT_INDEX_POS: usize = 12;
pub const ENT_CLASS_CHASSIS: i64 = 3;
pub const ENT_CLASS_MODULE: i64 = 9;

// CISCO-STACKWISE-MIB cswSwitchInfoTable, indexed by entPhysicalIndex
pub const STACK_NUM: &str = "1.3.6.1.4.1.9.9.500.1.2.1.1.1";
pub const STACK_ROLE: &str = "1.3.6.1.4.1.9.9.500.1.2.1.1.3";
pub const STACK_PRIORITY: &str = "1.3.6.1.4.1.9.9.500.1.2.1.1.4";
pub const STACK_MAC: &str = "1.3.6.1.4.1.9.9.500.1.2.1.1.7";
pub const STACK_IMAGE: &str = "1.3.6.1.4.1.9.9.500.1.2.1.1.8";
pub const STACK_INDEX_POS: usize = 14;

// CISCO-VIRTUAL-SWITCH-MIB
pub const VSS_MODE: &str = "1.3.6.1.4.1.9.9.388.1.1.4.0";
pub const VSS_MODE_ENABLED: &str = "2";
pub const VSS_DOMAIN: &str = "1.3.6.1.4.1.9.9.388.1.1.1.0";
pub const VSS_MODULES: &str = "1.3.6.1.4.1.9.9.388.1.4.1.1.1";
pub const VSS_MAX_MEMBERS: usize = 2;

// CISCO-VLAN-IFTABLE-RELATIONSHIP-MIB cviRoutedVlanIfIndex
pub const SVI_VLAN_IF: &str = "1.3.6.1.4.1.9.9.128.1.1.1.1.3";
pub const SVI_VLAN_POS: usize = 14;

// CISCO-VPC-MIB peer-link ifIndex, indexed by domain
pub const VPC_PEERLINK_IF: &str = "1.3.6.1.4.1.9.9.807.1.4.1.1.2";

// Routing protocols
pub const OSPF_ROUTER_ID: &str = "1.3.6.1.2.1.14.1.1.0";
pub const OSPF_ADMIN_STATUS: &str = "1.3.6.1.2.1.14.1.2.0";
pub const BGP_LOCAL_AS: &str = "1.3.6.1.2.1.15.2.0";
pub const HSRP_PRIORITY: &str = "1.3.6.1.4.1.9.9.106.1.2.1.1.3.1.10";
pub const HSRP_VIP: &str = "1.3.6.1.4.1.9.9.106.1.2.1.1.11.1.10";

// OLD-CISCO-CHASSIS-MIB boot file
pub const BOOT_FILE: &str = "1.3.6.1.4.1.9.2.1.73.0";
