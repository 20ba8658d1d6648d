use time::OffsetDateTime;

/// A 50-character, time-ordered primary key.
///
/// Layout: 15-digit zero-padded milliseconds since the epoch, 32 hex digits of
/// a random v4 uuid, then `000`. Ids from a later millisecond sort after earlier ones.
pub fn next_id() -> String {
   let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
   next_id_at(u64::try_from(millis).unwrap_or_default())
}

/// [`next_id`] for a given millisecond timestamp
pub fn next_id_at(millis: u64) -> String {
   format!("{:015}{}000", millis, uuid::Uuid::new_v4().simple())
}
