// SQLite glue between the executor and rusqlite:
// - params: binding middleware values onto prepared statements
// - query: reading column values back out of result rows

pub(crate) mod params;
pub(crate) mod query;
