//! Lease arithmetic

use std::time::Duration;

/// Safety margin kept between a refresh and the end of a lease.
pub const MIN_REFRESH_MARGIN: Duration = Duration::from_secs(10 * 60);

/// When to refresh something that is valid for `lease`.
///
/// Long leases are refreshed [`MIN_REFRESH_MARGIN`] before they end. Leases
/// shorter than twice the margin are refreshed halfway through instead.
///
/// ```
/// use cfgvault_secrets::suggested_refresh_interval;
/// use std::time::Duration;
///
/// assert_eq!(
///     suggested_refresh_interval(Duration::from_secs(3600)),
///     Duration::from_secs(3000)
/// );
/// assert_eq!(
///     suggested_refresh_interval(Duration::from_secs(120)),
///     Duration::from_secs(60)
/// );
/// ```
#[must_use]
pub fn suggested_refresh_interval(lease: Duration) -> Duration {
    if lease < MIN_REFRESH_MARGIN * 2 {
        lease / 2
    } else {
        lease - MIN_REFRESH_MARGIN
    }
}

/// Fold a record's lease into the running minimum.
///
/// Records without lease information do not take part in the reduction.
pub(crate) fn min_lease(current: Option<Duration>, next: Option<Duration>) -> Option<Duration> {
    match (current, next) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
