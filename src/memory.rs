use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    ops::Bound,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};
use async_trait::async_trait;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{Container, Item, ItemPage, StorageGateway};


/// Failures to inject into an [`InMemoryGateway`].
#[derive(Debug, Default)]
pub struct Faults {
    pub fail_enumeration: bool,
    /// bucket -> 1-based number of the listing call that fails
    pub fail_listing_at_page: HashMap<String, usize>,
    /// (bucket, key) pairs whose deletion always fails
    pub failing_keys: HashSet<(String, String)>,
    pub failing_removals: HashSet<String>,
    /// hand out a continuation token on the last non-empty page as well
    pub trailing_empty_page: bool,
}

#[derive(Debug, Default)]
struct Counters {
    list_calls: HashMap<String, usize>,
    delete_calls: HashMap<String, usize>,
    removal_calls: HashMap<String, usize>,
}

/// Key-ordered storage held in memory. Continuation tokens are the last key of the
/// previous page, so deleting already listed objects never shifts later pages.
pub struct InMemoryGateway {
    buckets: Mutex<BTreeMap<String, BTreeSet<String>>>,
    order: Mutex<Vec<String>>,
    page_size: usize,
    delete_delay: Duration,
    faults: Faults,
    counters: Mutex<Counters>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl InMemoryGateway {
    pub fn new(page_size: usize) -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            order: Mutex::new(Vec::new()),
            page_size: page_size.max(1),
            delete_delay: Duration::ZERO,
            faults: Faults::default(),
            counters: Mutex::new(Counters::default()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = delay;
        self
    }

    /// Add a bucket holding `num_objects` objects named `obj-0000`, `obj-0001`, ...
    /// Buckets are listed in the order they were added.
    pub fn with_bucket(self, name: &str, num_objects: usize) -> Self {
        let keys = (0..num_objects).map(|i| format!("obj-{i:04}"));
        self.with_bucket_keys(name, keys)
    }

    pub fn with_bucket_keys<I, S>(self, name: &str, keys: I) -> Self
    where I: IntoIterator<Item = S>,
          S: Into<String> {
        let keys: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        if let Ok(mut buckets) = self.buckets.lock() {
            buckets.insert(name.to_owned(), keys);
        }
        if let Ok(mut order) = self.order.lock() {
            order.push(name.to_owned());
        }
        self
    }

    pub fn bucket_exists(&self, name: &str) -> bool {
        self.buckets.lock().map(|b| b.contains_key(name)).unwrap_or(false)
    }

    pub fn remaining_objects(&self, name: &str) -> usize {
        self.buckets.lock()
            .ok()
            .and_then(|b| b.get(name).map(BTreeSet::len))
            .unwrap_or(0)
    }

    pub fn list_calls(&self, name: &str) -> usize {
        self.count(|c| &c.list_calls, name)
    }

    pub fn delete_calls(&self, name: &str) -> usize {
        self.count(|c| &c.delete_calls, name)
    }

    pub fn removal_calls(&self, name: &str) -> usize {
        self.count(|c| &c.removal_calls, name)
    }

    /// highest number of deletes that were running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn count(&self, select: impl Fn(&Counters) -> &HashMap<String, usize>, name: &str) -> usize {
        self.counters.lock()
            .ok()
            .and_then(|c| select(&*c).get(name).copied())
            .unwrap_or(0)
    }

    fn bump(&self, select: impl Fn(&mut Counters) -> &mut HashMap<String, usize>, name: &str) -> usize {
        match self.counters.lock() {
            Ok(mut c) => {
                let n = select(&mut *c).entry(name.to_owned()).or_insert(0);
                *n += 1;
                *n
            }
            Err(_) => 0,
        }
    }

    fn poisoned() -> GatewayError {
        GatewayError::Injected("in-memory store lock poisoned".to_owned())
    }
}

#[async_trait]
impl StorageGateway for InMemoryGateway {
    async fn list_containers(&self) -> GatewayResult<Vec<Container>> {
        if self.faults.fail_enumeration {
            return Err(GatewayError::Injected("listing of buckets refused".to_owned()));
        }
        let order = self.order.lock().map_err(|_| Self::poisoned())?;
        let buckets = self.buckets.lock().map_err(|_| Self::poisoned())?;
        Ok(order.iter()
            .filter(|name| buckets.contains_key(*name))
            .map(Container::new)
            .collect())
    }

    async fn list_items(&self, container: &str, cursor: Option<String>) -> GatewayResult<ItemPage> {
        let call = self.bump(|c| &mut c.list_calls, container);
        if self.faults.fail_listing_at_page.get(container) == Some(&call) {
            return Err(GatewayError::Injected(format!("listing page {call} of {container} refused")));
        }

        let buckets = self.buckets.lock().map_err(|_| Self::poisoned())?;
        let keys = buckets.get(container)
            .ok_or_else(|| GatewayError::ContainerNotFound(container.to_owned()))?;
        let lower = match cursor.as_deref() {
            Some(after) => Bound::Excluded(after),
            None => Bound::Unbounded,
        };
        let mut remaining = keys.range::<str, _>((lower, Bound::Unbounded));
        let items: Vec<Item> = remaining.by_ref()
            .take(self.page_size)
            .map(|key| Item { key: key.clone() })
            .collect();
        let more = remaining.next().is_some();

        let next_cursor = match items.last() {
            Some(last) if more || self.faults.trailing_empty_page => Some(last.key.clone()),
            _ if items.is_empty() && self.faults.trailing_empty_page => cursor,
            _ => None,
        };
        Ok(ItemPage { items, next_cursor })
    }

    async fn delete_item(&self, container: &str, key: &str) -> GatewayResult<()> {
        self.bump(|c| &mut c.delete_calls, container);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delete_delay.is_zero() {
            tokio::time::sleep(self.delete_delay).await;
        }
        let result = if self.faults.failing_keys.contains(&(container.to_owned(), key.to_owned())) {
            Err(GatewayError::Injected(format!("deletion of {container}:{key} refused")))
        } else {
            match self.buckets.lock() {
                Ok(mut buckets) => match buckets.get_mut(container) {
                    Some(keys) => match keys.remove(key) {
                        true => Ok(()),
                        false => Err(GatewayError::ItemNotFound {
                            container: container.to_owned(),
                            key: key.to_owned(),
                        }),
                    },
                    None => Err(GatewayError::ContainerNotFound(container.to_owned())),
                },
                Err(_) => Err(Self::poisoned()),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn delete_container(&self, container: &str) -> GatewayResult<()> {
        self.bump(|c| &mut c.removal_calls, container);
        if self.faults.failing_removals.contains(container) {
            return Err(GatewayError::Injected(format!("deletion of bucket {container} refused")));
        }
        let mut buckets = self.buckets.lock().map_err(|_| Self::poisoned())?;
        match buckets.get(container) {
            None => Err(GatewayError::ContainerNotFound(container.to_owned())),
            Some(keys) if !keys.is_empty() => Err(GatewayError::ContainerNotEmpty(container.to_owned())),
            Some(_) => {
                buckets.remove(container);
                Ok(())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_follow_key_order() {
        let gateway = InMemoryGateway::new(2).with_bucket_keys("b", ["c", "a", "b"]);

        let first = gateway.list_items("b", None).await.unwrap();
        let keys: Vec<_> = first.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(first.next_cursor.as_deref(), Some("b"));

        let second = gateway.list_items("b", first.next_cursor).await.unwrap();
        assert_eq!(second.items, vec![Item { key: "c".to_owned() }]);
        assert_eq!(second.next_cursor, None);
    }

    #[tokio::test]
    async fn test_trailing_empty_page_keeps_token() {
        let faults = Faults { trailing_empty_page: true, ..Faults::default() };
        let gateway = InMemoryGateway::new(5).with_bucket("b", 3).with_faults(faults);

        let first = gateway.list_items("b", None).await.unwrap();
        assert_eq!(first.items.len(), 3);
        let token = first.next_cursor.clone();
        assert!(token.is_some());

        let second = gateway.list_items("b", token.clone()).await.unwrap();
        assert!(second.items.is_empty());
        assert_eq!(second.next_cursor, token);
    }

    #[tokio::test]
    async fn test_remove_non_empty_bucket_fails() {
        let gateway = InMemoryGateway::new(5).with_bucket("b", 1);

        let err = gateway.delete_container("b").await.unwrap_err();
        assert!(matches!(err, GatewayError::ContainerNotEmpty(_)));
        assert!(gateway.bucket_exists("b"));

        gateway.delete_item("b", "obj-0000").await.unwrap();
        gateway.delete_container("b").await.unwrap();
        assert!(!gateway.bucket_exists("b"));
        assert_eq!(gateway.removal_calls("b"), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_an_error() {
        let gateway = InMemoryGateway::new(5).with_bucket("b", 0);

        let err = gateway.delete_item("b", "nope").await.unwrap_err();
        assert!(matches!(err, GatewayError::ItemNotFound { .. }));
        assert_eq!(gateway.delete_calls("b"), 1);
    }
}
