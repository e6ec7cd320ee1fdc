//! Data-fetch boundary and stale-response guard.
//!
//! Fetch failures never propagate past this module: they are logged and
//! replaced with an empty result so the view can render "no data".

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use futures::join;
use tracing::{debug, warn};

use crate::notice::NoticeBoard;
use crate::plan::PlanEditor;
use crate::record::HourRecord;
use crate::status::StatusMap;
use crate::{FetchError, ObjectId, SubjectId};

/// Banner text shown when a fetch fails
pub const FETCH_FAILED: &str = "Не удалось загрузить данные";

/// Whose plan is being fetched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Subject(SubjectId),
    Object(ObjectId),
}

/// Supplier of raw hour records and plan statuses
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn subject_hours(
        &self,
        date: NaiveDate,
        subject: SubjectId,
    ) -> Result<Vec<HourRecord>, FetchError>;

    async fn object_hours(
        &self,
        date: NaiveDate,
        object: ObjectId,
    ) -> Result<Vec<HourRecord>, FetchError>;

    async fn statuses(&self, date: NaiveDate, target: Target) -> Result<StatusMap, FetchError>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Replace a failed fetch with an empty value
pub fn or_empty<T: Default>(result: Result<T, FetchError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "{what} fetch failed, using empty result");
        T::default()
    })
}

/// Hour records for a subject or object; empty on failure
pub async fn fetch_hours(
    source: &dyn RecordSource,
    date: NaiveDate,
    target: Target,
) -> Vec<HourRecord> {
    let result = match target {
        Target::Subject(id) => source.subject_hours(date, id).await,
        Target::Object(id) => source.object_hours(date, id).await,
    };
    or_empty(result, "hours")
}

/// Fetch every object's hours concurrently.
///
/// A failing object yields an empty list without affecting the others.
/// Results are in the order of `objects`.
pub async fn fetch_object_hours(
    source: &dyn RecordSource,
    date: NaiveDate,
    objects: &[ObjectId],
) -> Vec<(ObjectId, Vec<HourRecord>)> {
    let fetches = objects.iter().map(|&object| async move {
        let hours = or_empty(source.object_hours(date, object).await, "object hours");
        (object, hours)
    });
    let joined = join_all(fetches).await;
    debug!(source = source.name(), objects = joined.len(), "object hours joined");
    joined
}

/// Statuses for a target; `None` renders as "no data"
pub async fn fetch_statuses(
    source: &dyn RecordSource,
    date: NaiveDate,
    target: Target,
) -> Option<StatusMap> {
    match source.statuses(date, target).await {
        Ok(map) => Some(map),
        Err(e) => {
            warn!(error = %e, ?target, "status fetch failed");
            None
        }
    }
}

/// Everything the plan view needs for one selection
#[derive(Debug)]
pub struct PlanFetch {
    pub ticket: Ticket,
    pub target: Target,
    pub date: NaiveDate,
    pub hours: Result<Vec<HourRecord>, FetchError>,
    pub statuses: Option<StatusMap>,
    pub object_hours: Vec<(ObjectId, Vec<HourRecord>)>,
}

/// Fetch plan hours, statuses and object hours concurrently.
///
/// Holds no session borrow, so a newer selection can start while this
/// is in flight; its ticket then makes the result stale.
pub async fn fetch_plan(
    source: &dyn RecordSource,
    ticket: Ticket,
    target: Target,
    date: NaiveDate,
    objects: &[ObjectId],
) -> PlanFetch {
    let hours = async {
        match target {
            Target::Subject(id) => source.subject_hours(date, id).await,
            Target::Object(id) => source.object_hours(date, id).await,
        }
    };
    let (hours, statuses, object_hours) = join!(
        hours,
        fetch_statuses(source, date, target),
        fetch_object_hours(source, date, objects)
    );
    PlanFetch {
        ticket,
        target,
        date,
        hours,
        statuses,
        object_hours,
    }
}

// ============================================================================
// Stale-response guard
// ============================================================================

/// Generation token issued when a selection starts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Generation counter: only the newest ticket is current
#[derive(Debug, Default)]
pub struct SelectionGuard {
    generation: u64,
}

impl SelectionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new selection, invalidating every earlier ticket
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        Ticket(self.generation)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }
}

/// Plan view state for the currently selected entity and date
#[derive(Debug, Default)]
pub struct PlanSession {
    guard: SelectionGuard,
    selection: Option<(Target, NaiveDate)>,
    editor: PlanEditor,
    statuses: Option<StatusMap>,
    object_hours: Vec<(ObjectId, Vec<HourRecord>)>,
    notices: NoticeBoard,
}

impl PlanSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session whose notices stay up for `ttl`
    pub fn with_notice_ttl(ttl: Duration) -> Self {
        Self {
            notices: NoticeBoard::new(ttl),
            ..Self::default()
        }
    }

    pub fn selection(&self) -> Option<(Target, NaiveDate)> {
        self.selection
    }

    pub fn editor(&self) -> &PlanEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut PlanEditor {
        &mut self.editor
    }

    pub fn statuses(&self) -> Option<&StatusMap> {
        self.statuses.as_ref()
    }

    pub fn object_hours(&self) -> &[(ObjectId, Vec<HourRecord>)] {
        &self.object_hours
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// Switch selection; previous data is cleared and earlier tickets go stale
    pub fn select(&mut self, target: Target, date: NaiveDate) -> Ticket {
        self.selection = Some((target, date));
        self.editor.reset();
        self.statuses = None;
        self.object_hours.clear();
        self.guard.begin()
    }

    fn accept(&self, ticket: Ticket, what: &str) -> bool {
        let current = self.guard.is_current(ticket);
        if !current {
            debug!(?ticket, "dropping stale {what} response");
        }
        current
    }

    /// Apply fetched hours; returns false when the ticket is stale
    pub fn apply_plan(&mut self, ticket: Ticket, records: &[HourRecord]) -> bool {
        if !self.accept(ticket, "plan") {
            return false;
        }
        self.editor.apply_fetched(records);
        true
    }

    pub fn apply_statuses(&mut self, ticket: Ticket, statuses: Option<StatusMap>) -> bool {
        if !self.accept(ticket, "status") {
            return false;
        }
        self.statuses = statuses;
        true
    }

    pub fn apply_object_hours(
        &mut self,
        ticket: Ticket,
        hours: Vec<(ObjectId, Vec<HourRecord>)>,
    ) -> bool {
        if !self.accept(ticket, "object hours") {
            return false;
        }
        self.object_hours = hours;
        true
    }

    /// Apply a finished fetch; returns false and changes nothing when
    /// a newer selection has started since its ticket was issued.
    ///
    /// A failed plan fetch leaves default hours and raises a notice.
    pub fn apply(&mut self, fetched: PlanFetch) -> bool {
        let PlanFetch {
            ticket,
            target,
            date,
            hours,
            statuses,
            object_hours,
        } = fetched;
        if !self.accept(ticket, "plan") {
            return false;
        }
        let hours = match hours {
            Ok(hours) => hours,
            Err(e) => {
                warn!(error = %e, ?target, %date, "plan fetch failed");
                self.notices.raise(FETCH_FAILED, Instant::now());
                Vec::new()
            }
        };
        self.editor.apply_fetched(&hours);
        self.statuses = statuses;
        self.object_hours = object_hours;
        true
    }

    /// Select and fetch everything the plan view shows
    pub async fn load(
        &mut self,
        source: &dyn RecordSource,
        target: Target,
        date: NaiveDate,
        objects: &[ObjectId],
    ) -> bool {
        let ticket = self.select(target, date);
        let fetched = fetch_plan(source, ticket, target, date, objects).await;
        self.apply(fetched)
    }
}
