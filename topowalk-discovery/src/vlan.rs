//! Allowed-VLAN bitmap codec
//!
//! Trunk ports report their allowed VLANs as an octet string in which bit
//! `n`, counted from the high bit of the first octet, stands for VLAN `n`.
//! The decoder turns it into the compact form used in diagrams
//! (`1,10-12,100`), with `All` for a full range and `none` for an empty one.

/// Highest VLAN the decoder looks at
pub const MAX_VLAN: usize = 1001;

/// Text for a bitmap covering every VLAN
pub const ALL_VLANS: &str = "All";
/// Text for a bitmap with no VLAN set
pub const NO_VLANS: &str = "none";

fn bits(raw: &str) -> Option<Vec<bool>> {
    let digits = raw.strip_prefix("0x")?;
    if digits.is_empty() {
        return None;
    }

    let mut bits = Vec::with_capacity(digits.len() * 4);
    for c in digits.chars() {
        let nibble = c.to_digit(16)?;
        for shift in (0..4).rev() {
            bits.push(nibble & (1 << shift) != 0);
        }
    }
    Some(bits)
}

/// Decode an allowed-VLAN bitmap given as `0x…` hex.
///
/// Only positions up to [`MAX_VLAN`] are considered. A run that reaches the
/// last considered position is extended to `MAX_VLAN`, so a bitmap that is
/// set from VLAN 1 (or 0) to its end reads as `All`. Input that is not hex
/// also reads as `All`.
pub fn decode_allowed_vlans(raw: &str) -> String {
    let Some(bits) = bits(raw) else {
        return ALL_VLANS.to_string();
    };

    let limit = bits.len().min(MAX_VLAN + 1);
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut start: Option<usize> = None;

    for (vlan, &set) in bits.iter().enumerate().take(limit) {
        match (set, start) {
            (true, None) => start = Some(vlan),
            (false, Some(s)) => {
                runs.push((s, vlan - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, MAX_VLAN));
    }

    match runs.as_slice() {
        [] => NO_VLANS.to_string(),
        [(s, e)] if *s <= 1 && *e == MAX_VLAN => ALL_VLANS.to_string(),
        _ => runs
            .iter()
            .map(|&(s, e)| {
                if s == e {
                    s.to_string()
                } else {
                    format!("{}-{}", s, e)
                }
            })
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Encode the textual form back into a bitmap of `len` octets.
///
/// Unparsable items are ignored and positions past the bitmap are dropped.
pub fn encode_allowed_vlans(text: &str, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    let mut set = |vlan: usize| {
        if let Some(byte) = bytes.get_mut(vlan / 8) {
            *byte |= 0x80 >> (vlan % 8);
        }
    };

    match text {
        ALL_VLANS => (1..=MAX_VLAN).for_each(&mut set),
        NO_VLANS => {}
        _ => {
            for item in text.split(',').map(str::trim) {
                let range = match item.split_once('-') {
                    Some((a, b)) => a.parse::<usize>().ok().zip(b.parse::<usize>().ok()),
                    None => item.parse::<usize>().ok().map(|v| (v, v)),
                };
                if let Some((a, b)) = range {
                    (a..=b).for_each(&mut set);
                }
            }
        }
    }
    bytes
}
