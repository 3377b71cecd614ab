/// Verification codes are this many digits.
pub const OTP_CODE_LEN: usize = 6;

/// Failed entries allowed per delivered code.
pub const OTP_MAX_ATTEMPTS: u32 = 3;

/// Wait between "send code" requests, in milliseconds.
pub const OTP_RESEND_COOLDOWN_MS: f64 = 30_000.0;

/// How long three failed entries lock out verification, in milliseconds.
pub const OTP_LOCKOUT_MS: f64 = 30_000.0;

/// Client-side throttle for the one-time-code challenge on guest signing.
///
/// Timestamps come in as milliseconds (`js_sys::Date::now()` in the browser,
/// plain numbers in tests) so the gate itself stays free of web APIs. The
/// server enforces its own limits; this only keeps the UI honest.
///
/// Three rejected codes lock verification for [`OTP_LOCKOUT_MS`]. The lock
/// expires on its own; the full attempt budget comes back without a resend.
#[derive(Debug, Clone, Copy, Default)]
pub struct OtpGate {
    sent_at_ms: Option<f64>,
    failed_attempts: u32,
    locked_until_ms: Option<f64>,
}

impl OtpGate {
    pub fn can_send(&self, now_ms: f64) -> bool {
        match self.sent_at_ms {
            Some(sent) => now_ms - sent >= OTP_RESEND_COOLDOWN_MS,
            None => true,
        }
    }

    /// Whole seconds until resend unlocks, 0 when it already has.
    pub fn resend_wait_secs(&self, now_ms: f64) -> u32 {
        let Some(sent) = self.sent_at_ms else { return 0 };
        let remaining_ms = OTP_RESEND_COOLDOWN_MS - (now_ms - sent);
        if remaining_ms <= 0.0 {
            0
        } else {
            (remaining_ms / 1000.0).ceil() as u32
        }
    }

    /// A fresh code went out; the attempt counter starts over.
    pub fn mark_sent(&mut self, now_ms: f64) {
        self.sent_at_ms = Some(now_ms);
        self.failed_attempts = 0;
        self.locked_until_ms = None;
    }

    pub fn code_sent(&self) -> bool {
        self.sent_at_ms.is_some()
    }

    fn lock_expired(&self, now_ms: f64) -> bool {
        matches!(self.locked_until_ms, Some(until) if now_ms >= until)
    }

    pub fn is_locked(&self, now_ms: f64) -> bool {
        matches!(self.locked_until_ms, Some(until) if now_ms < until)
    }

    /// Whole seconds until the lock expires, 0 when not locked.
    pub fn lock_wait_secs(&self, now_ms: f64) -> u32 {
        let Some(until) = self.locked_until_ms else {
            return 0;
        };
        let remaining_ms = until - now_ms;
        if remaining_ms <= 0.0 {
            0
        } else {
            (remaining_ms / 1000.0).ceil() as u32
        }
    }

    pub fn attempts_left(&self, now_ms: f64) -> u32 {
        if self.lock_expired(now_ms) {
            OTP_MAX_ATTEMPTS
        } else {
            OTP_MAX_ATTEMPTS.saturating_sub(self.failed_attempts)
        }
    }

    /// Count a rejected code. The third failure starts the lockout window;
    /// an expired lock clears before counting. Returns the attempts still
    /// available.
    pub fn record_failure(&mut self, now_ms: f64) -> u32 {
        if self.lock_expired(now_ms) {
            self.failed_attempts = 0;
            self.locked_until_ms = None;
        }
        self.failed_attempts = (self.failed_attempts + 1).min(OTP_MAX_ATTEMPTS);
        if self.failed_attempts >= OTP_MAX_ATTEMPTS && self.locked_until_ms.is_none() {
            self.locked_until_ms = Some(now_ms + OTP_LOCKOUT_MS);
        }
        self.attempts_left(now_ms)
    }
}

/// Accepts a user-typed code if it is exactly [`OTP_CODE_LEN`] digits,
/// ignoring surrounding whitespace. Anything else is rejected before it
/// ever reaches the network.
pub fn normalize_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.len() == OTP_CODE_LEN && trimmed.chars().all(|c| c.is_ascii_digit()) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_send_always_allowed() {
        let gate = OtpGate::default();
        assert!(gate.can_send(0.0));
        assert_eq!(gate.resend_wait_secs(0.0), 0);
        assert!(!gate.code_sent());
    }

    #[test]
    fn test_resend_blocked_for_thirty_seconds() {
        let mut gate = OtpGate::default();
        gate.mark_sent(1_000.0);
        assert!(!gate.can_send(1_000.0));
        assert_eq!(gate.resend_wait_secs(1_000.0), 30);
        assert!(!gate.can_send(16_000.0));
        assert_eq!(gate.resend_wait_secs(16_000.0), 15);
        assert!(gate.can_send(31_000.0));
        assert_eq!(gate.resend_wait_secs(31_000.0), 0);
    }

    #[test]
    fn test_wait_rounds_up_to_whole_seconds() {
        let mut gate = OtpGate::default();
        gate.mark_sent(0.0);
        // 29.999s remaining still reads as 30
        assert_eq!(gate.resend_wait_secs(1.0), 30);
        assert_eq!(gate.resend_wait_secs(29_500.0), 1);
    }

    #[test]
    fn test_locks_after_three_failures() {
        let mut gate = OtpGate::default();
        gate.mark_sent(0.0);
        assert_eq!(gate.attempts_left(0.0), 3);
        assert_eq!(gate.record_failure(1_000.0), 2);
        assert_eq!(gate.record_failure(2_000.0), 1);
        assert!(!gate.is_locked(2_000.0));
        assert_eq!(gate.record_failure(3_000.0), 0);
        assert!(gate.is_locked(3_000.0));
        // Extra failures inside the window neither underflow nor extend it
        assert_eq!(gate.record_failure(4_000.0), 0);
        assert!(!gate.is_locked(33_000.0));
    }

    #[test]
    fn test_lock_expires_without_a_resend() {
        let mut gate = OtpGate::default();
        gate.mark_sent(0.0);
        gate.record_failure(1_000.0);
        gate.record_failure(2_000.0);
        gate.record_failure(3_000.0);
        assert!(gate.is_locked(3_000.0));
        assert_eq!(gate.lock_wait_secs(3_000.0), 30);
        assert_eq!(gate.attempts_left(3_000.0), 0);
        assert!(gate.is_locked(32_999.0));

        // Thirty seconds after the third failure the gate reopens with the
        // full budget, no new code required
        assert!(!gate.is_locked(33_000.0));
        assert_eq!(gate.lock_wait_secs(33_000.0), 0);
        assert_eq!(gate.attempts_left(33_000.0), 3);
        assert_eq!(gate.record_failure(34_000.0), 2);
        assert!(!gate.is_locked(34_000.0));
    }

    #[test]
    fn test_fresh_code_resets_attempts() {
        let mut gate = OtpGate::default();
        gate.mark_sent(0.0);
        gate.record_failure(1_000.0);
        gate.record_failure(2_000.0);
        gate.record_failure(3_000.0);
        assert!(gate.is_locked(3_000.0));
        gate.mark_sent(31_000.0);
        assert!(!gate.is_locked(31_000.0));
        assert_eq!(gate.attempts_left(31_000.0), 3);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("123456"), Some("123456".to_string()));
        assert_eq!(normalize_code("  123456  "), Some("123456".to_string()));
        assert_eq!(normalize_code("12345"), None);
        assert_eq!(normalize_code("1234567"), None);
        assert_eq!(normalize_code("12a456"), None);
        assert_eq!(normalize_code(""), None);
    }
}
