/// Anti-sniping time extension
// region:    --- Imports
use crate::auction::model::Auction;
use chrono::{DateTime, Duration, Utc};
// endregion: --- Imports

/// Window before the close inside which an accepted bid pushes the end time
/// back out, in minutes.
pub const ANTI_SNIPE_WINDOW_MINUTES: i64 = 5;

/// New end time after an accepted bid. If less than the window remains, the
/// close moves to `now + window`; otherwise it is unchanged. Repeated calls
/// inside the window keep pushing the close forward, so a last-second bid
/// always leaves time for a counter-bid. Never returns an earlier end time.
pub fn maybe_extend(auction: &Auction, now: DateTime<Utc>) -> DateTime<Utc> {
    let window = Duration::minutes(ANTI_SNIPE_WINDOW_MINUTES);
    if auction.end_time - now < window {
        now + window
    } else {
        auction.end_time
    }
}
