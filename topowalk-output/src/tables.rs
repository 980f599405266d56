//! ARP and forwarding-database exports (CSV)

use std::io::Write;

use topowalk_core::Result;
use topowalk_discovery::{ArpEntry, FdbEntry};

use crate::catalog::csv_error;

/// Write ARP entries as `IP,MAC,Interface,VLAN,Type`
pub fn write_arp<W: Write>(entries: &[ArpEntry], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(["IP", "MAC", "Interface", "VLAN", "Type"])
        .map_err(csv_error)?;

    for entry in entries {
        writer
            .write_record([
                entry.ip.to_string(),
                entry.mac.to_string(),
                entry.interface.clone().unwrap_or_default(),
                entry.vlan.map(|v| v.to_string()).unwrap_or_default(),
                entry.entry_type.to_string(),
            ])
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write forwarding-database entries as `VLAN,MAC,Port`
pub fn write_fdb<W: Write>(entries: &[FdbEntry], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(["VLAN", "MAC", "Port"])
        .map_err(csv_error)?;

    for entry in entries {
        writer
            .write_record([
                entry.vlan.to_string(),
                entry.mac.to_string(),
                entry.port.clone().unwrap_or_default(),
            ])
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}
