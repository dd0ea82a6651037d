pub mod attendance;
pub mod leave_request;
pub mod report;
pub mod student;

use chrono::{Local, NaiveDateTime};

/// Wall-clock time of the school, which is what the day and month rules use.
pub(crate) fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
