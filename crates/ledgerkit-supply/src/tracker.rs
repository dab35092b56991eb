//! SupplyTracker — products moving through a fixed status lifecycle.
//!
//! A product's history only ever grows: each accepted transition appends
//! one entry stamped with the transaction time and rewrites the record.

use ledgerkit_core::record::{decode_record, encode_record, require_simple_key};
use ledgerkit_core::{LedgerAccessor, RecordError, RecordResult};
use tracing::{debug, info};

use crate::lifecycle::TransitionGraph;
use crate::types::{Product, StatusEntry};

pub const EVENT_PRODUCT_REGISTERED: &str = "ProductRegistered";
pub const EVENT_PRODUCT_STATUS_UPDATED: &str = "ProductStatusUpdated";

/// Identifier carried by errors from the full product scan.
pub const ALL_PRODUCTS: &str = "<all products>";

/// State machine store for products.
#[derive(Debug, Clone, Default)]
pub struct SupplyTracker {
    graph: TransitionGraph,
}

impl SupplyTracker {
    pub fn new(graph: TransitionGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &TransitionGraph {
        &self.graph
    }

    /// Start tracking a product in the graph's initial status.
    pub fn register_product<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &mut L,
        product_id: &str,
    ) -> RecordResult<Product> {
        require_simple_key(product_id, "product ID")?;
        let existing = ledger
            .get_state(product_id)
            .map_err(|e| RecordError::store(product_id, e))?;
        if existing.is_some() {
            return Err(RecordError::AlreadyExists(product_id.to_string()));
        }

        let status = self.graph.initial().to_string();
        let product = Product {
            product_id: product_id.to_string(),
            current_status: status.clone(),
            status_history: vec![stamp(ledger, product_id, status)?],
        };
        self.write(ledger, &product, EVENT_PRODUCT_REGISTERED)?;

        debug!(product_id, status = %product.current_status, "product registered");
        Ok(product)
    }

    /// Move a product to `new_status`, appending it to the history.
    ///
    /// Checks run in order: empty ID, undeclared status, missing product,
    /// unchanged status, then whether the graph has the edge.
    pub fn update_status<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &mut L,
        product_id: &str,
        new_status: &str,
    ) -> RecordResult<Product> {
        require_simple_key(product_id, "product ID")?;
        if !self.graph.contains(new_status) {
            return Err(RecordError::invalid_input(
                product_id,
                format!("invalid status: {new_status}"),
            ));
        }

        let mut product = self.get_product(ledger, product_id)?;
        if product.current_status == new_status {
            return Err(RecordError::NoOp {
                id: product_id.to_string(),
                status: new_status.to_string(),
            });
        }
        if !self.graph.allows(&product.current_status, new_status) {
            return Err(RecordError::InvalidTransition {
                id: product_id.to_string(),
                from: product.current_status,
                to: new_status.to_string(),
            });
        }

        let entry = stamp(ledger, product_id, new_status.to_string())?;
        let from = std::mem::replace(&mut product.current_status, new_status.to_string());
        product.status_history.push(entry);
        self.write(ledger, &product, EVENT_PRODUCT_STATUS_UPDATED)?;

        debug!(product_id, from = %from, to = new_status, "product status updated");
        if self.graph.is_terminal(new_status) {
            info!(
                product_id,
                status = new_status,
                steps = product.status_history.len(),
                "product reached terminal status"
            );
        }
        Ok(product)
    }

    pub fn get_product<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &L,
        product_id: &str,
    ) -> RecordResult<Product> {
        require_simple_key(product_id, "product ID")?;
        let bytes = ledger
            .get_state(product_id)
            .map_err(|e| RecordError::store(product_id, e))?
            .ok_or_else(|| RecordError::NotFound(product_id.to_string()))?;
        decode_record(product_id, &bytes)
    }

    /// The product's status history, oldest first.
    pub fn get_product_history<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &L,
        product_id: &str,
    ) -> RecordResult<Vec<StatusEntry>> {
        Ok(self.get_product(ledger, product_id)?.status_history)
    }

    /// Every product on the ledger, in ascending ID order.
    pub fn get_all_products<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &L,
    ) -> RecordResult<Vec<Product>> {
        let entries = ledger
            .state_by_range("", "")
            .map_err(|e| RecordError::store(ALL_PRODUCTS, e))?;

        let mut products = Vec::new();
        for entry in entries {
            let (key, bytes) = entry.map_err(|e| RecordError::store(ALL_PRODUCTS, e))?;
            products.push(decode_record(&key, &bytes)?);
        }
        Ok(products)
    }

    /// Products whose current status is `status`, in ascending ID order.
    pub fn get_products_by_status<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &L,
        status: &str,
    ) -> RecordResult<Vec<Product>> {
        if !self.graph.contains(status) {
            return Err(RecordError::invalid_input(
                status,
                format!("invalid status: {status}"),
            ));
        }
        let products = self.get_all_products(ledger)?;
        Ok(products
            .into_iter()
            .filter(|p| p.current_status == status)
            .collect())
    }

    /// Statuses the product may move to next; empty once terminal.
    pub fn allowed_transitions<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &L,
        product_id: &str,
    ) -> RecordResult<Vec<String>> {
        let product = self.get_product(ledger, product_id)?;
        let successors = self
            .graph
            .successors(&product.current_status)
            .ok_or_else(|| {
                RecordError::invalid_input(
                    product_id,
                    format!("stored status {:?} is not in the lifecycle", product.current_status),
                )
            })?;
        Ok(successors.to_vec())
    }

    fn write<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &mut L,
        product: &Product,
        event: &str,
    ) -> RecordResult<()> {
        let id = product.product_id.as_str();
        let bytes = encode_record(id, product)?;
        ledger
            .put_state(id, bytes.clone())
            .map_err(|e| RecordError::store(id, e))?;
        ledger
            .set_event(event, bytes)
            .map_err(|e| RecordError::store(id, e))
    }
}

/// A history entry for `status` at the transaction's time.
fn stamp<L: LedgerAccessor + ?Sized>(
    ledger: &L,
    product_id: &str,
    status: String,
) -> RecordResult<StatusEntry> {
    let timestamp = ledger
        .tx_timestamp()
        .and_then(|ts| ts.to_rfc3339())
        .map_err(|e| RecordError::store(product_id, e))?;
    Ok(StatusEntry { status, timestamp })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{DELIVERED, IN_TRANSIT, MANUFACTURED, SHIPPED};
    use ledgerkit_core::{
        ErrorKind, Ledger, LedgerBackend, LedgerError, LedgerResult, MemoryLedger, StateIter,
        Transaction, TxHeader, TxTimestamp, WriteBatch,
    };

    /// 2024-03-01T12:00:00Z
    const T0: i64 = 1_709_294_400;

    fn header(offset: i64) -> TxHeader {
        TxHeader::new(format!("tx-{offset}"), TxTimestamp::new(T0 + offset, 0))
    }

    fn submit<T>(
        ledger: &Ledger<MemoryLedger>,
        offset: i64,
        op: impl FnOnce(&mut Transaction<'_, MemoryLedger>) -> RecordResult<T>,
    ) -> RecordResult<T> {
        ledger.submit(header(offset), op).map(|(output, _)| output)
    }

    fn query<T>(
        ledger: &Ledger<MemoryLedger>,
        offset: i64,
        op: impl FnOnce(&Transaction<'_, MemoryLedger>) -> RecordResult<T>,
    ) -> RecordResult<T> {
        ledger.query(header(offset), op)
    }

    fn setup() -> (Ledger<MemoryLedger>, SupplyTracker) {
        (Ledger::new(MemoryLedger::new()), SupplyTracker::default())
    }

    fn statuses(history: &[StatusEntry]) -> Vec<&str> {
        history.iter().map(|e| e.status.as_str()).collect()
    }

    // ── Register ───────────────────────────────────────────────────

    #[test]
    fn register_starts_in_initial_status() {
        let (ledger, tracker) = setup();

        let (product, receipt) = ledger
            .submit(header(0), |tx| tracker.register_product(tx, "P1"))
            .unwrap();

        assert_eq!(product.current_status, MANUFACTURED);
        assert_eq!(
            product.status_history,
            vec![StatusEntry {
                status: MANUFACTURED.to_string(),
                timestamp: "2024-03-01T12:00:00Z".to_string(),
            }]
        );
        assert_eq!(query(&ledger, 1, |tx| tracker.get_product(tx, "P1")).unwrap(), product);

        let event = receipt.event.unwrap();
        assert_eq!(event.name, EVENT_PRODUCT_REGISTERED);
        let emitted: Product = serde_json::from_slice(&event.payload).unwrap();
        assert_eq!(emitted, product);
        assert_eq!(receipt.writes, 1);
    }

    #[test]
    fn register_uses_configured_initial_status() {
        let graph = TransitionGraph::new(
            "Ordered",
            [("Ordered", vec!["Packed"]), ("Packed", vec![])],
        )
        .unwrap();
        let ledger = Ledger::new(MemoryLedger::new());
        let tracker = SupplyTracker::new(graph);
        assert_eq!(tracker.graph().initial(), "Ordered");
        assert!(tracker.graph().is_terminal("Packed"));

        let product = submit(&ledger, 0, |tx| tracker.register_product(tx, "P1")).unwrap();
        assert_eq!(product.current_status, "Ordered");
        assert_eq!(
            query(&ledger, 1, |tx| tracker.allowed_transitions(tx, "P1")).unwrap(),
            vec!["Packed"]
        );
    }

    #[test]
    fn register_rejects_empty_id() {
        let (ledger, tracker) = setup();
        let err = submit(&ledger, 0, |tx| tracker.register_product(tx, "")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(ledger.backend().is_empty());
    }

    #[test]
    fn duplicate_register_leaves_record_unchanged() {
        let (ledger, tracker) = setup();
        submit(&ledger, 0, |tx| tracker.register_product(tx, "P1")).unwrap();
        let before = ledger.backend().entries();

        let err = submit(&ledger, 5, |tx| tracker.register_product(tx, "P1")).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(ledger.backend().entries(), before);
    }

    #[test]
    fn id_in_composite_keyspace_is_invalid_input() {
        let (ledger, tracker) = setup();

        let err = submit(&ledger, 0, |tx| tracker.register_product(tx, "\u{0}P1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(ledger.backend().is_empty());

        let err = query(&ledger, 1, |tx| tracker.get_product(tx, "\u{0}P1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err =
            submit(&ledger, 1, |tx| tracker.update_status(tx, "\u{0}P1", SHIPPED)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn registered_products_are_all_listed() {
        let (ledger, tracker) = setup();
        for id in ["P1", "\u{1}P0", "P\u{0}2"] {
            submit(&ledger, 0, |tx| tracker.register_product(tx, id)).unwrap();
        }

        let all = query(&ledger, 1, |tx| tracker.get_all_products(tx)).unwrap();
        assert_eq!(all.len(), 3);
        let made = query(&ledger, 1, |tx| tracker.get_products_by_status(tx, MANUFACTURED)).unwrap();
        assert_eq!(made, all);
    }

    // ── Update status ──────────────────────────────────────────────

    #[test]
    fn full_lifecycle_appends_history() {
        let (ledger, tracker) = setup();
        submit(&ledger, 0, |tx| tracker.register_product(tx, "P1")).unwrap();

        for (offset, status) in [(60, SHIPPED), (120, IN_TRANSIT), (180, DELIVERED)] {
            let product =
                submit(&ledger, offset, |tx| tracker.update_status(tx, "P1", status)).unwrap();
            assert_eq!(product.current_status, status);
            assert_eq!(product.status_history.last().unwrap().status, status);
        }

        let history = query(&ledger, 200, |tx| tracker.get_product_history(tx, "P1")).unwrap();
        assert_eq!(
            statuses(&history),
            vec![MANUFACTURED, SHIPPED, IN_TRANSIT, DELIVERED]
        );
        assert_eq!(history[1].timestamp, "2024-03-01T12:01:00Z");
        assert_eq!(history[3].timestamp, "2024-03-01T12:03:00Z");
        assert!(
            query(&ledger, 201, |tx| tracker.allowed_transitions(tx, "P1"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn update_emits_status_event() {
        let (ledger, tracker) = setup();
        submit(&ledger, 0, |tx| tracker.register_product(tx, "P1")).unwrap();

        let (_, receipt) = ledger
            .submit(header(1), |tx| tracker.update_status(tx, "P1", SHIPPED))
            .unwrap();

        let event = receipt.event.unwrap();
        assert_eq!(event.name, EVENT_PRODUCT_STATUS_UPDATED);
        let emitted: Product = serde_json::from_slice(&event.payload).unwrap();
        assert_eq!(emitted.current_status, SHIPPED);
        assert_eq!(emitted.status_history.len(), 2);
    }

    #[test]
    fn skipping_a_step_is_invalid_transition() {
        let (ledger, tracker) = setup();
        submit(&ledger, 0, |tx| tracker.register_product(tx, "P1")).unwrap();
        submit(&ledger, 1, |tx| tracker.update_status(tx, "P1", SHIPPED)).unwrap();
        let before = ledger.backend().entries();

        let err = submit(&ledger, 2, |tx| tracker.update_status(tx, "P1", DELIVERED)).unwrap_err();

        assert!(matches!(
            &err,
            RecordError::InvalidTransition { from, to, .. } if from == SHIPPED && to == DELIVERED
        ));
        assert_eq!(ledger.backend().entries(), before);
    }

    #[test]
    fn moving_backwards_is_invalid_transition() {
        let (ledger, tracker) = setup();
        submit(&ledger, 0, |tx| tracker.register_product(tx, "P1")).unwrap();
        submit(&ledger, 1, |tx| tracker.update_status(tx, "P1", SHIPPED)).unwrap();

        let err =
            submit(&ledger, 2, |tx| tracker.update_status(tx, "P1", MANUFACTURED)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn delivered_is_terminal() {
        let (ledger, tracker) = setup();
        submit(&ledger, 0, |tx| tracker.register_product(tx, "P1")).unwrap();
        for (offset, status) in [(1, SHIPPED), (2, IN_TRANSIT), (3, DELIVERED)] {
            submit(&ledger, offset, |tx| tracker.update_status(tx, "P1", status)).unwrap();
        }

        for status in [MANUFACTURED, SHIPPED, IN_TRANSIT] {
            let err = submit(&ledger, 4, |tx| tracker.update_status(tx, "P1", status)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        }
    }

    #[test]
    fn same_status_is_noop() {
        let (ledger, tracker) = setup();
        submit(&ledger, 0, |tx| tracker.register_product(tx, "P1")).unwrap();

        let err =
            submit(&ledger, 1, |tx| tracker.update_status(tx, "P1", MANUFACTURED)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NoOp);
        let history = query(&ledger, 2, |tx| tracker.get_product_history(tx, "P1")).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn unknown_status_is_invalid_input() {
        let (ledger, tracker) = setup();
        submit(&ledger, 0, |tx| tracker.register_product(tx, "P1")).unwrap();

        let err = submit(&ledger, 1, |tx| tracker.update_status(tx, "P1", "Lost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("invalid status: Lost"));
    }

    #[test]
    fn update_checks_run_in_order() {
        let (ledger, tracker) = setup();

        // Empty ID wins over an unknown status.
        let err = submit(&ledger, 0, |tx| tracker.update_status(tx, "", "Lost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("product ID cannot be empty"));

        // Unknown status wins over a missing product.
        let err = submit(&ledger, 0, |tx| tracker.update_status(tx, "P9", "Lost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = submit(&ledger, 0, |tx| tracker.update_status(tx, "P9", SHIPPED)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.id(), "P9");
    }

    // ── Reads ──────────────────────────────────────────────────────

    #[test]
    fn get_missing_product_is_not_found() {
        let (ledger, tracker) = setup();
        let err = query(&ledger, 0, |tx| tracker.get_product(tx, "P1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = query(&ledger, 0, |tx| tracker.get_product_history(tx, "P1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = query(&ledger, 0, |tx| tracker.get_product(tx, "")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn list_and_filter_by_status() {
        let (ledger, tracker) = setup();
        for id in ["P3", "P1", "P2"] {
            submit(&ledger, 0, |tx| tracker.register_product(tx, id)).unwrap();
        }
        submit(&ledger, 1, |tx| tracker.update_status(tx, "P2", SHIPPED)).unwrap();

        let all = query(&ledger, 2, |tx| tracker.get_all_products(tx)).unwrap();
        let ids: Vec<_> = all.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2", "P3"]);

        let made = query(&ledger, 2, |tx| tracker.get_products_by_status(tx, MANUFACTURED)).unwrap();
        let ids: Vec<_> = made.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P3"]);

        assert!(
            query(&ledger, 2, |tx| tracker.get_products_by_status(tx, DELIVERED))
                .unwrap()
                .is_empty()
        );
        let err = query(&ledger, 2, |tx| tracker.get_products_by_status(tx, "Lost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn empty_ledger_lists_nothing() {
        let (ledger, tracker) = setup();
        assert!(query(&ledger, 0, |tx| tracker.get_all_products(tx)).unwrap().is_empty());
    }

    #[test]
    fn corrupt_record_fails_listing() {
        let (ledger, tracker) = setup();
        submit(&ledger, 0, |tx| tracker.register_product(tx, "P1")).unwrap();
        ledger
            .backend()
            .apply(WriteBatch::new().put("P2", b"{\"productID\":".to_vec()))
            .unwrap();

        let err = query(&ledger, 1, |tx| tracker.get_all_products(tx)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert_eq!(err.id(), "P2");
    }

    #[test]
    fn allowed_transitions_follow_current_status() {
        let (ledger, tracker) = setup();
        submit(&ledger, 0, |tx| tracker.register_product(tx, "P1")).unwrap();
        assert_eq!(
            query(&ledger, 1, |tx| tracker.allowed_transitions(tx, "P1")).unwrap(),
            vec![SHIPPED]
        );
        submit(&ledger, 1, |tx| tracker.update_status(tx, "P1", SHIPPED)).unwrap();
        assert_eq!(
            query(&ledger, 2, |tx| tracker.allowed_transitions(tx, "P1")).unwrap(),
            vec![IN_TRANSIT]
        );
    }

    #[test]
    fn reads_within_a_transaction_see_committed_state() {
        let (ledger, tracker) = setup();

        // Registering twice in one transaction: the second check reads the
        // committed state, where P1 does not exist yet.
        let result = submit(&ledger, 0, |tx| {
            tracker.register_product(tx, "P1")?;
            tracker.update_status(tx, "P1", SHIPPED)
        });
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
        assert!(ledger.backend().is_empty());
    }

    /// Accessor whose range scan yields a storage failure.
    struct UnreadableLedger;

    impl LedgerAccessor for UnreadableLedger {
        fn tx_id(&self) -> &str {
            "tx-broken"
        }

        fn tx_timestamp(&self) -> LedgerResult<TxTimestamp> {
            Ok(TxTimestamp::new(T0, 0))
        }

        fn get_state(&self, _key: &str) -> LedgerResult<Option<Vec<u8>>> {
            Ok(None)
        }

        fn apply_writes(&mut self, _batch: WriteBatch) -> LedgerResult<()> {
            Ok(())
        }

        fn state_by_range(&self, _start: &str, _end: &str) -> LedgerResult<StateIter<'_>> {
            Ok(Box::new(std::iter::once(Err(LedgerError::backend(
                "page checksum mismatch",
            )))))
        }

        fn state_by_partial_composite_key(
            &self,
            _namespace: &str,
            _segments: &[&str],
        ) -> LedgerResult<StateIter<'_>> {
            Err(LedgerError::backend("unreachable in these tests"))
        }

        fn set_event(&mut self, _name: &str, _payload: Vec<u8>) -> LedgerResult<()> {
            Ok(())
        }
    }

    #[test]
    fn scan_failure_names_the_product_range() {
        let tracker = SupplyTracker::default();

        let err = tracker.get_all_products(&UnreadableLedger).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Store);
        assert_eq!(err.id(), ALL_PRODUCTS);
        assert!(err.to_string().contains("page checksum mismatch"));

        let err = tracker
            .get_products_by_status(&UnreadableLedger, SHIPPED)
            .unwrap_err();
        assert_eq!(err.id(), ALL_PRODUCTS);
    }
}
