pub mod db_utils;
pub mod scan_lock;
