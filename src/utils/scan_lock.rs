use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-student async locks. A badge scan holds its student's lock while it
/// reads the latest scan and inserts the next one, so two readers tapping the
/// same card at once still alternate masuk/keluar.
///
/// Entries expire only after `idle` without use. There is no size bound, since
/// evicting a live entry would hand the next scan a fresh mutex. `idle` must
/// stay well above the store timeout so a lock is never evicted while held.
#[derive(Clone)]
pub struct ScanLocks {
    locks: Cache<u64, Arc<Mutex<()>>>,
}

impl ScanLocks {
    pub fn new(idle: Duration) -> Self {
        Self {
            locks: Cache::builder().time_to_idle(idle).build(),
        }
    }

    /// Waits for and takes the lock of `student_id`.
    pub async fn acquire(&self, student_id: u64) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(student_id, async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_student_is_serialized() {
        let locks = ScanLocks::new(Duration::from_secs(60));
        let guard = locks.acquire(1).await;

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = other.acquire(1).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn different_students_do_not_block() {
        let locks = ScanLocks::new(Duration::from_secs(60));
        let _a = locks.acquire(1).await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.acquire(2)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn lock_survives_many_other_students() {
        let locks = ScanLocks::new(Duration::from_secs(60));
        let guard = locks.acquire(1).await;
        for id in 2..60_002 {
            drop(locks.acquire(id).await);
        }
        locks.locks.run_pending_tasks().await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(1)).await;
        assert!(second.is_err());
        drop(guard);
    }
}
