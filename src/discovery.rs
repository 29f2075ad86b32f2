//! Sequential user discovery for upstreams without a bulk listing endpoint.

use std::future::Future;
use tracing::{debug, warn};

use crate::error::Result;
use crate::mantis::types::User;

/// Consecutive not-found lookups tolerated before the scan stops.
pub const MAX_MISS_STREAK: u32 = 10;

/// Enumerate users by probing ids sequentially, starting at 1.
///
/// A successful lookup appends the user and resets the miss streak. An
/// upstream 404 advances past the gap and lengthens the streak. Any other
/// error aborts the scan and propagates. The scan ends once
/// [`MAX_MISS_STREAK`] consecutive ids are missing.
///
/// This is a heuristic linear scan with no upper id bound other than the
/// miss-streak cutoff: it costs one request per id up to the highest
/// reachable one, and it under-reports id spaces containing a gap of more
/// than [`MAX_MISS_STREAK`] consecutive ids. Lookups must stay sequential;
/// the miss streak depends on id adjacency.
pub async fn probe_users<F, Fut>(mut lookup: F) -> Result<Vec<User>>
where
  F: FnMut(u64) -> Fut,
  Fut: Future<Output = Result<User>>,
{
  let mut users = Vec::new();
  let mut miss_streak = 0u32;
  let mut id = 1u64;

  while miss_streak < MAX_MISS_STREAK {
    match lookup(id).await {
      Ok(user) => {
        users.push(user);
        miss_streak = 0;
      }
      Err(err) if err.is_not_found() => {
        miss_streak += 1;
        debug!(id, miss_streak, "user id not present");
      }
      Err(err) => {
        warn!(id, error = %err, "aborting user discovery");
        return Err(err);
      }
    }
    id += 1;
  }

  Ok(users)
}
