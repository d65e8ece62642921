//! Parsing of the fingerprinting tool output.

use super::jobs::AudioFingerprint;

/// Length of `FINGERPRINT=`.
const FINGERPRINT_PREFIX_LEN: usize = 12;

/// Parse the two-line `DURATION=<seconds>` / `FINGERPRINT=<token>` output.
pub fn parse_fpcalc_output(stdout: &str) -> Option<AudioFingerprint> {
    let mut lines = stdout.lines();

    let duration = lines.next()?.split('=').nth(1)?.trim();
    let fingerprint = lines.next()?.get(FINGERPRINT_PREFIX_LEN..)?.trim();

    if duration.is_empty() || fingerprint.is_empty() {
        return None;
    }

    Some(AudioFingerprint {
        duration: duration.to_string(),
        fingerprint: fingerprint.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_output() {
        let parsed = parse_fpcalc_output("DURATION=184\nFINGERPRINT=AQADtMmybfGO8NCNEESLnQ\n");
        assert_eq!(
            parsed,
            Some(AudioFingerprint {
                duration: "184".to_string(),
                fingerprint: "AQADtMmybfGO8NCNEESLnQ".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_tolerates_crlf() {
        let parsed = parse_fpcalc_output("DURATION=3\r\nFINGERPRINT=AQAB\r\n").unwrap();
        assert_eq!(parsed.duration, "3");
        assert_eq!(parsed.fingerprint, "AQAB");
    }

    #[test]
    fn test_parse_rejects_malformed_output() {
        assert_eq!(parse_fpcalc_output(""), None);
        assert_eq!(parse_fpcalc_output("DURATION=12\n"), None);
        assert_eq!(parse_fpcalc_output("DURATION\nFINGERPRINT=AQAB\n"), None);
        assert_eq!(parse_fpcalc_output("DURATION=12\nFINGERPRINT=\n"), None);
        assert_eq!(parse_fpcalc_output("DURATION=12\nshort\n"), None);
    }
}
