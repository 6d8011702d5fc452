/// All entity primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Users are identified by the UUID the gateway puts in `x-userid`.
pub type UserId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (`YYYY-MM-DD`) for scheduled checkins and streak bookkeeping.
pub type Date = chrono::NaiveDate;
