//! Special handling code segregation (simplified IATA rules).
//!
//! The conflict map is deliberately one-directional; `check_mix`
//! symmetrizes at the call site by testing both directions.

use std::collections::BTreeSet;

/// SHCs that may not share a ULD with the given code.
fn conflicts_of(code: &str) -> &'static [&'static str] {
    match code {
        "RXB" => &["GEN", "RCX", "RFL"],
        "AVI" => &["RRY", "ICE", "HUM"],
        "HUM" => &["EAT", "PES"],
        "EAT" => &["HUM", "RPB", "RIS"],
        _ => &[],
    }
}

/// True if `new_shc` may join a ULD already carrying `existing`.
pub fn check_mix(existing: &BTreeSet<String>, new_shc: &str) -> bool {
    if conflicts_of(new_shc).iter().any(|bad| existing.contains(*bad)) {
        return false;
    }
    !existing
        .iter()
        .any(|code| conflicts_of(code).contains(&new_shc))
}

/// True if every code of the cargo is mixable with the ULD's current set.
pub fn compatible(existing: &BTreeSet<String>, codes: &[String]) -> bool {
    codes.iter().all(|code| check_mix(existing, code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn listed_direction_conflicts() {
        // AVI lists RRY
        assert!(!check_mix(&set(&["AVI"]), "RRY"));
        assert!(!check_mix(&set(&["RXB"]), "GEN"));
    }

    #[test]
    fn reverse_direction_conflicts() {
        // RRY lists nothing itself; the conflict is found via AVI's list
        assert!(!check_mix(&set(&["RRY"]), "AVI"));
        assert!(!check_mix(&set(&["GEN"]), "RXB"));
    }

    #[test]
    fn unrelated_codes_mix() {
        assert!(check_mix(&set(&["AVI"]), "GEN"));
        assert!(check_mix(&set(&[]), "RRY"));
        assert!(check_mix(&set(&["ICE"]), "GEN"));
    }

    #[test]
    fn compatible_requires_every_code_to_mix() {
        assert!(compatible(&set(&["GEN"]), &["ICE".to_string()]));
        assert!(!compatible(
            &set(&["AVI"]),
            &["GEN".to_string(), "RRY".to_string()]
        ));
        // empty code list is always compatible
        assert!(compatible(&set(&["AVI"]), &[]));
    }
}
