//! # List Controller
//!
//! Owns the accumulated profiles and the pagination flags. Commands return
//! immediately; fetches run on spawned tasks and report back over a channel,
//! and only the owner applies their results. Observers follow along through a
//! `watch` channel that receives one snapshot per applied mutation.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ErrorInfo, FetchError};
use crate::models::{Profile, ProfileRecord};
use crate::traits::ProfileGateway;

/// Profiles requested per page.
pub const DEFAULT_BATCH_SIZE: usize = 20;

const COMMAND_BUFFER: usize = 32;

/// How the presentation layer lays out the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    List,
    Grid,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::List => DisplayMode::Grid,
            DisplayMode::Grid => DisplayMode::List,
        }
    }
}

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    /// Fetch order; only `reload` removes entries.
    pub profiles: Vec<Profile>,
    pub is_loading: bool,
    pub last_error: Option<ErrorInfo>,
    pub display_mode: DisplayMode,
    pub selected: Option<Profile>,
}

impl ListState {
    pub fn is_grid_display(&self) -> bool {
        self.display_mode == DisplayMode::Grid
    }

    /// Pagination trigger: `item` is the last loaded profile and nothing is in flight.
    pub fn should_load_more(&self, item: &Profile) -> bool {
        self.is_pagination_trigger(item.id)
    }

    pub fn is_pagination_trigger(&self, id: Uuid) -> bool {
        !self.is_loading && self.profiles.last().is_some_and(|last| last.id == id)
    }

    pub fn profile(&self, id: Uuid) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }
}

/// Messages accepted by [`ListController::run`].
#[derive(Debug, Clone)]
pub enum Command {
    FetchMore,
    Reload,
    /// Re-issues whichever of `FetchMore` / `Reload` was issued last.
    Retry,
    Select(Profile),
    ClearSelection,
    ToggleDisplayMode,
    SetDisplayMode(DisplayMode),
    /// The row with this id was rendered.
    ItemDisplayed(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    FetchMore,
    Reload,
}

/// Result of one gateway call, tagged with the generation it was issued in.
#[derive(Debug)]
struct FetchOutcome {
    generation: u64,
    result: Result<Vec<ProfileRecord>, FetchError>,
}

pub struct ListController {
    gateway: Arc<dyn ProfileGateway>,
    batch_size: usize,
    state: ListState,
    /// Bumped by `reload`; outcomes from older generations are dropped.
    generation: u64,
    /// Spawned fetches whose outcome has not been received yet.
    pending: usize,
    last_request: Request,
    publisher: watch::Sender<ListState>,
    completions_tx: mpsc::UnboundedSender<FetchOutcome>,
    completions_rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl ListController {
    pub fn new(gateway: Arc<dyn ProfileGateway>) -> Self {
        let (publisher, _) = watch::channel(ListState::default());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            batch_size: DEFAULT_BATCH_SIZE,
            state: ListState::default(),
            generation: 0,
            pending: 0,
            last_request: Request::FetchMore,
            publisher,
            completions_tx,
            completions_rx,
        }
    }

    /// Overrides the page size. Zero is clamped to one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.publisher.subscribe()
    }

    /// Requests the next page. Returns `false` when a fetch is already in
    /// flight; the call is dropped, not queued.
    pub fn fetch_more(&mut self) -> bool {
        if self.state.is_loading {
            debug!("fetch already in flight, dropping request");
            return false;
        }
        self.last_request = Request::FetchMore;
        self.issue_fetch();
        true
    }

    /// Empties the collection right away, then fetches a fresh first page.
    ///
    /// Results of fetches issued before the reload are discarded when they
    /// arrive.
    pub fn reload(&mut self) {
        self.generation += 1;
        self.last_request = Request::Reload;
        self.state.profiles.clear();
        debug!(generation = self.generation, "reloading profiles");
        self.issue_fetch();
    }

    pub fn retry(&mut self) {
        match self.last_request {
            Request::FetchMore => {
                self.fetch_more();
            }
            Request::Reload => self.reload(),
        }
    }

    /// No membership check against `profiles`.
    pub fn select_profile(&mut self, profile: Profile) {
        self.state.selected = Some(profile);
        self.publish();
    }

    pub fn clear_selection(&mut self) {
        if self.state.selected.take().is_some() {
            self.publish();
        }
    }

    pub fn toggle_display_mode(&mut self) {
        self.state.display_mode = self.state.display_mode.toggled();
        self.publish();
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if self.state.display_mode != mode {
            self.state.display_mode = mode;
            self.publish();
        }
    }

    /// Applies the pagination trigger for a rendered row.
    pub fn item_displayed(&mut self, id: Uuid) -> bool {
        if self.state.is_pagination_trigger(id) {
            self.fetch_more()
        } else {
            false
        }
    }

    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::FetchMore => {
                self.fetch_more();
            }
            Command::Reload => self.reload(),
            Command::Retry => self.retry(),
            Command::Select(profile) => self.select_profile(profile),
            Command::ClearSelection => self.clear_selection(),
            Command::ToggleDisplayMode => self.toggle_display_mode(),
            Command::SetDisplayMode(mode) => self.set_display_mode(mode),
            Command::ItemDisplayed(id) => {
                self.item_displayed(id);
            }
        }
    }

    /// Waits for the next fetch to complete and applies it. Returns `false`
    /// immediately when no fetch is outstanding.
    pub async fn process_next(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(outcome) => {
                self.apply(outcome);
                true
            }
            None => false,
        }
    }

    /// Applies every completion that has already arrived, without waiting.
    pub fn drain_completed(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.completions_rx.try_recv() {
            self.apply(outcome);
            applied += 1;
        }
        applied
    }

    /// Processes completions until the current generation's fetch has landed.
    pub async fn settle(&mut self) {
        while self.state.is_loading {
            if !self.process_next().await {
                break;
            }
        }
    }

    /// Single-owner event loop: interleaves incoming commands with fetch
    /// completions until the command channel closes.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                Some(outcome) = self.completions_rx.recv() => self.apply(outcome),
                command = commands.recv() => match command {
                    Some(command) => self.dispatch(command),
                    None => break,
                },
            }
        }
        debug!(pending = self.pending, "command channel closed, controller stopping");
    }

    fn issue_fetch(&mut self) {
        self.state.is_loading = true;
        self.state.last_error = None;
        self.pending += 1;
        self.publish();

        let generation = self.generation;
        let quantity = self.batch_size;
        let gateway = Arc::clone(&self.gateway);
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            // Inner task so a panicking gateway still reports an outcome.
            let fetch = tokio::spawn(async move { gateway.fetch_profiles(quantity).await });
            let result = match fetch.await {
                Ok(result) => result,
                Err(join_err) => Err(FetchError::Unexpected(format!(
                    "profile fetch aborted: {join_err}"
                ))),
            };
            // The controller may be gone already.
            let _ = completions.send(FetchOutcome { generation, result });
        });
    }

    fn apply(&mut self, outcome: FetchOutcome) {
        self.pending = self.pending.saturating_sub(1);

        if outcome.generation != self.generation {
            debug!(
                stale = outcome.generation,
                current = self.generation,
                "discarding result of superseded fetch"
            );
            return;
        }

        match outcome.result {
            Ok(records) => {
                let received = records.len();
                let before = self.state.profiles.len();
                for profile in records.into_iter().map(Profile::from_record) {
                    if !self.state.profiles.contains(&profile) {
                        self.state.profiles.push(profile);
                    }
                }
                info!(
                    received,
                    appended = self.state.profiles.len() - before,
                    total = self.state.profiles.len(),
                    "applied profile page"
                );
            }
            Err(err) => {
                let info = ErrorInfo::classify(err);
                warn!(error = %info, "profile fetch failed");
                self.state.last_error = Some(info);
            }
        }

        // Profiles first, then the flag, then one snapshot.
        self.state.is_loading = false;
        self.publish();
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

/// A controller running on its own task.
pub struct ControllerHandle {
    pub commands: mpsc::Sender<Command>,
    pub state: watch::Receiver<ListState>,
    pub task: JoinHandle<()>,
}

/// Moves the controller onto a task driven by [`ListController::run`].
pub fn spawn(controller: ListController) -> ControllerHandle {
    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let state = controller.subscribe();
    let task = tokio::spawn(controller.run(receiver));
    ControllerHandle {
        commands,
        state,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkReason;
    use crate::models::{Birth, Name, Picture};
    use crate::traits::MockProfileGateway;
    use async_trait::async_trait;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type Reply = Result<Vec<ProfileRecord>, FetchError>;

    /// Gateway whose calls block until the test releases them, in call order.
    #[derive(Default)]
    struct GatedGateway {
        calls: AtomicUsize,
        gates: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    }

    impl GatedGateway {
        fn arm(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().push_back(rx);
            tx
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn wait_for_calls(&self, n: usize) {
            while self.calls() < n {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl ProfileGateway for GatedGateway {
        async fn fetch_profiles(&self, _quantity: usize) -> Reply {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.lock().unwrap().pop_front().expect("no gate armed");
            gate.await
                .unwrap_or_else(|_| Err(FetchError::Unexpected("gate dropped".into())))
        }
    }

    struct PanickingGateway;

    #[async_trait]
    impl ProfileGateway for PanickingGateway {
        async fn fetch_profiles(&self, _quantity: usize) -> Reply {
            panic!("gateway exploded");
        }
    }

    fn record(first: &str) -> ProfileRecord {
        ProfileRecord {
            name: Name {
                title: "Mr".into(),
                first: first.into(),
                last: "Doe".into(),
            },
            dob: Birth::from_json(r#"{"date": "1994-02-03T10:00:00.000Z", "age": 30}"#).unwrap(),
            picture: Picture {
                large: format!("https://example.com/{first}/large.jpg"),
                medium: format!("https://example.com/{first}/medium.jpg"),
                thumbnail: format!("https://example.com/{first}/thumb.jpg"),
            },
        }
    }

    fn firsts(state: &ListState) -> Vec<&str> {
        state.profiles.iter().map(|p| p.name.first.as_str()).collect()
    }

    fn mock_returning(pages: Vec<Reply>) -> MockProfileGateway {
        let mut gateway = MockProfileGateway::new();
        let mut seq = Sequence::new();
        for page in pages {
            let mut page = Some(page);
            gateway
                .expect_fetch_profiles()
                .with(eq(DEFAULT_BATCH_SIZE))
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| page.take().expect("page served twice"));
        }
        gateway
    }

    #[tokio::test]
    async fn initial_state_is_empty() {
        let controller = ListController::new(Arc::new(MockProfileGateway::new()));
        let state = controller.state();
        assert!(state.profiles.is_empty());
        assert!(!state.is_loading);
        assert!(!state.is_grid_display());
        assert!(state.last_error.is_none());
        assert!(state.selected.is_none());
        assert_eq!(controller.batch_size(), DEFAULT_BATCH_SIZE);
    }

    #[tokio::test]
    async fn fetch_more_coalesces_while_in_flight() {
        let gateway = Arc::new(GatedGateway::default());
        let gate = gateway.arm();
        let mut controller = ListController::new(gateway.clone());

        assert!(controller.fetch_more());
        assert!(!controller.fetch_more());
        gateway.wait_for_calls(1).await;
        assert!(!controller.fetch_more());

        gate.send(Ok(vec![record("John")])).unwrap();
        controller.settle().await;

        assert_eq!(gateway.calls(), 1);
        assert_eq!(firsts(controller.state()), ["John"]);
    }

    #[tokio::test]
    async fn appends_pages_in_fetch_order() {
        let gateway = mock_returning(vec![
            Ok(vec![record("John")]),
            Ok(vec![record("Jane")]),
        ]);
        let mut controller = ListController::new(Arc::new(gateway));

        controller.fetch_more();
        controller.settle().await;
        controller.fetch_more();
        controller.settle().await;

        assert_eq!(firsts(controller.state()), ["John", "Jane"]);
        assert!(!controller.state().is_loading);
    }

    #[tokio::test]
    async fn overlapping_pages_are_deduplicated() {
        let gateway = mock_returning(vec![
            Ok(vec![record("A"), record("B")]),
            Ok(vec![record("B"), record("C")]),
        ]);
        let mut controller = ListController::new(Arc::new(gateway));

        controller.fetch_more();
        controller.settle().await;
        controller.fetch_more();
        controller.settle().await;

        assert_eq!(firsts(controller.state()), ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn duplicates_inside_one_page_are_dropped() {
        let gateway = mock_returning(vec![Ok(vec![record("A"), record("A"), record("B")])]);
        let mut controller = ListController::new(Arc::new(gateway));

        controller.fetch_more();
        controller.settle().await;

        assert_eq!(firsts(controller.state()), ["A", "B"]);
    }

    #[tokio::test]
    async fn reload_clears_immediately_then_repopulates() {
        let gateway = Arc::new(GatedGateway::default());
        let first = gateway.arm();
        let mut controller = ListController::new(gateway.clone());

        controller.fetch_more();
        first.send(Ok(vec![record("A"), record("B")])).unwrap();
        controller.settle().await;
        assert_eq!(firsts(controller.state()), ["A", "B"]);

        let second = gateway.arm();
        controller.reload();
        assert!(controller.state().profiles.is_empty());
        assert!(controller.state().is_loading);

        second.send(Ok(vec![record("X")])).unwrap();
        controller.settle().await;
        assert_eq!(firsts(controller.state()), ["X"]);
        assert!(!controller.state().is_loading);
    }

    #[tokio::test]
    async fn loading_flag_spans_request_on_success_and_failure() {
        let gateway = Arc::new(GatedGateway::default());
        let mut controller = ListController::new(gateway.clone());
        let replies: [Reply; 2] = [
            Ok(vec![record("A")]),
            Err(FetchError::Network(NetworkReason::TimedOut)),
        ];

        for (i, reply) in replies.into_iter().enumerate() {
            assert!(!controller.state().is_loading);
            let gate = gateway.arm();
            controller.fetch_more();
            assert!(controller.state().is_loading);
            gateway.wait_for_calls(i + 1).await;
            assert_eq!(controller.drain_completed(), 0);
            assert!(controller.state().is_loading);

            gate.send(reply).unwrap();
            assert!(controller.process_next().await);
            assert!(!controller.state().is_loading);
        }
        assert_eq!(firsts(controller.state()), ["A"]);
    }

    #[tokio::test]
    async fn failures_are_classified_and_keep_profiles() {
        let cases = [
            (NetworkReason::Offline, "You appear to be offline. Please check your internet connection."),
            (NetworkReason::TimedOut, "The request timed out. Please try again."),
            (NetworkReason::HostUnreachable, "Unable to connect to the server. Please try again later."),
            (NetworkReason::ConnectionLost, "The network connection was lost. Please try again."),
            (NetworkReason::Other("bad gateway".into()), "A network error occurred: bad gateway"),
        ];

        for (reason, message) in cases {
            let gateway = mock_returning(vec![
                Ok(vec![record("A")]),
                Err(FetchError::Network(reason.clone())),
            ]);
            let mut controller = ListController::new(Arc::new(gateway));
            controller.fetch_more();
            controller.settle().await;
            controller.fetch_more();
            controller.settle().await;

            let state = controller.state();
            assert_eq!(state.last_error, Some(ErrorInfo::NetworkError(reason)));
            assert_eq!(state.last_error.as_ref().unwrap().user_message(), message);
            assert_eq!(firsts(state), ["A"]);
            assert!(!state.is_loading);
        }

        let gateway = mock_returning(vec![Err(FetchError::Unexpected("disk on fire".into()))]);
        let mut controller = ListController::new(Arc::new(gateway));
        controller.fetch_more();
        controller.settle().await;
        assert_eq!(
            controller.state().last_error,
            Some(ErrorInfo::UnexpectedError("disk on fire".into()))
        );
    }

    #[tokio::test]
    async fn next_fetch_clears_last_error() {
        let gateway = mock_returning(vec![
            Err(FetchError::Network(NetworkReason::Offline)),
            Ok(vec![record("A")]),
        ]);
        let mut controller = ListController::new(Arc::new(gateway));

        controller.fetch_more();
        controller.settle().await;
        assert!(controller.state().last_error.is_some());

        controller.retry();
        assert!(controller.state().last_error.is_none());
        controller.settle().await;
        assert_eq!(firsts(controller.state()), ["A"]);
    }

    #[tokio::test]
    async fn retry_after_failed_reload_reloads_again() {
        let gateway = Arc::new(GatedGateway::default());
        let mut controller = ListController::new(gateway.clone());

        let gate = gateway.arm();
        controller.fetch_more();
        gate.send(Ok(vec![record("A")])).unwrap();
        controller.settle().await;

        let gate = gateway.arm();
        controller.reload();
        gate.send(Err(FetchError::Network(NetworkReason::ConnectionLost))).unwrap();
        controller.settle().await;
        assert!(controller.state().profiles.is_empty());

        let gate = gateway.arm();
        controller.retry();
        gate.send(Ok(vec![record("B")])).unwrap();
        controller.settle().await;
        assert_eq!(firsts(controller.state()), ["B"]);
    }

    #[tokio::test]
    async fn results_from_before_a_reload_are_discarded() {
        let gateway = Arc::new(GatedGateway::default());
        let old = gateway.arm();
        let mut controller = ListController::new(gateway.clone());

        controller.fetch_more();
        gateway.wait_for_calls(1).await;

        let fresh = gateway.arm();
        controller.reload();
        gateway.wait_for_calls(2).await;

        old.send(Ok(vec![record("Stale")])).unwrap();
        assert!(controller.process_next().await);
        assert!(controller.state().profiles.is_empty());
        assert!(controller.state().is_loading);

        fresh.send(Ok(vec![record("X")])).unwrap();
        controller.settle().await;
        assert_eq!(firsts(controller.state()), ["X"]);
        assert!(!controller.state().is_loading);
        assert!(!controller.process_next().await);
    }

    #[tokio::test]
    async fn panicking_gateway_still_clears_loading() {
        let mut controller = ListController::new(Arc::new(PanickingGateway));
        controller.fetch_more();
        controller.settle().await;

        let state = controller.state();
        assert!(!state.is_loading);
        assert!(matches!(state.last_error, Some(ErrorInfo::UnexpectedError(_))));
    }

    #[tokio::test]
    async fn selection_and_display_mode() {
        let mut controller = ListController::new(Arc::new(MockProfileGateway::new()));
        let profile = Profile::from_record(record("John"));

        controller.select_profile(profile.clone());
        let selected = controller.state().selected.as_ref().unwrap();
        assert_eq!(selected.id, profile.id);
        assert_eq!(selected.name.last, "Doe");
        assert_eq!(selected.dob.age, 30);

        controller.clear_selection();
        assert!(controller.state().selected.is_none());

        controller.toggle_display_mode();
        assert!(controller.state().is_grid_display());
        controller.toggle_display_mode();
        assert_eq!(controller.state().display_mode, DisplayMode::List);
        controller.set_display_mode(DisplayMode::Grid);
        assert!(controller.state().is_grid_display());
        assert!(!controller.state().is_loading);
    }

    #[tokio::test]
    async fn only_the_last_row_triggers_pagination() {
        let mut gateway = MockProfileGateway::new();
        gateway
            .expect_fetch_profiles()
            .times(2)
            .returning(|_| Ok(vec![record("A"), record("B")]));
        let mut controller = ListController::new(Arc::new(gateway));

        controller.fetch_more();
        controller.settle().await;
        let first = controller.state().profiles[0].clone();
        let last = controller.state().profiles[1].clone();
        assert_eq!(
            controller.state().profile(last.id).map(|p| p.name.first.as_str()),
            Some("B")
        );
        assert!(controller.state().profile(Uuid::new_v4()).is_none());

        assert!(!controller.item_displayed(first.id));
        assert!(controller.state().should_load_more(&last));
        assert!(controller.item_displayed(last.id));
        assert!(!controller.state().should_load_more(&last));
        assert!(!controller.item_displayed(last.id));
        controller.settle().await;
        // Second page was identical, so nothing new was appended.
        assert_eq!(controller.state().profiles.len(), 2);
    }

    #[tokio::test]
    async fn subscribers_see_every_transition() {
        let gateway = Arc::new(GatedGateway::default());
        let gate = gateway.arm();
        let mut controller = ListController::new(gateway.clone());
        let mut updates = controller.subscribe();

        controller.fetch_more();
        assert!(updates.has_changed().unwrap());
        assert!(updates.borrow_and_update().is_loading);

        gate.send(Ok(vec![record("A")])).unwrap();
        controller.settle().await;
        let snapshot = updates.borrow_and_update().clone();
        assert!(!snapshot.is_loading);
        assert_eq!(firsts(&snapshot), ["A"]);
    }

    #[tokio::test]
    async fn spawned_controller_serves_commands() {
        let gateway = mock_returning(vec![Ok(vec![record("A"), record("B")])]);
        let mut handle = spawn(ListController::new(Arc::new(gateway)));

        handle.commands.send(Command::FetchMore).await.unwrap();
        handle.commands.send(Command::ToggleDisplayMode).await.unwrap();
        let state = handle
            .state
            .wait_for(|s| !s.is_loading && s.profiles.len() == 2 && s.is_grid_display())
            .await
            .unwrap()
            .clone();
        assert_eq!(firsts(&state), ["A", "B"]);

        drop(handle.commands);
        handle.task.await.unwrap();
    }
}
