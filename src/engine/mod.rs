mod availability;
mod error;
mod lifecycle;
mod queries;

pub use error::EngineError;
pub use lifecycle::RoomPatch;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, RwLock};
use ulid::Ulid;

use crate::model::*;
use crate::wal::Wal;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond Ok to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];

                // Drain all immediately available appends
                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => {
                            batch.push((event, response));
                        }
                        Ok(other) => {
                            // Flush current batch first, then handle the non-append command
                            flush_and_respond(&mut wal, &mut batch);
                            handle_non_append(&mut wal, other);
                            break;
                        }
                        Err(_) => break, // channel empty — flush batch
                    }
                }

                if !batch.is_empty() {
                    flush_and_respond(&mut wal, &mut batch);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn flush_and_respond(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = std::time::Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());
    respond_batch(batch, &result);
}

fn flush_batch(wal: &mut Wal, batch: &mut [(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch.iter() {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush — even on append error — so partially buffered bytes
    // don't leak into the next batch (callers were told this batch failed).
    let flush_err = wal.flush_sync().err();
    if let Some(e) = append_err {
        return Err(e);
    }
    if let Some(e) = flush_err {
        return Err(e);
    }
    Ok(())
}

fn respond_batch(batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>, result: &io::Result<()>) {
    for (_, tx) in batch.drain(..) {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!(),
    }
}

/// The front-desk state engine: rooms (each holding its reservations), staff
/// accounts, and the WAL that makes all of it durable.
///
/// Every room lives behind its own `RwLock`; lifecycle operations take that
/// lock for their whole validate-then-write span, so two concurrent bookings
/// for one room can never both pass the availability check.
pub struct Engine {
    pub(super) rooms: DashMap<Ulid, SharedRoomState>,
    /// Reverse lookup: reservation id → room id.
    pub(super) reservation_index: DashMap<Ulid, Ulid>,
    /// Unique-room-number index: number → room id.
    pub(super) room_numbers: DashMap<u32, Ulid>,
    pub(super) staff: DashMap<Ulid, StaffMember>,
    /// Unique-username index: username → staff id.
    pub(super) usernames: DashMap<String, Ulid>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
}

/// Apply an event directly to a RoomState (no locking — caller holds the lock).
fn apply_to_room(rs: &mut RoomState, event: &Event, reservation_index: &DashMap<Ulid, Ulid>) {
    match event {
        Event::RoomUpdated {
            number,
            room_type,
            price_per_night,
            status,
            ..
        } => {
            rs.room.number = *number;
            rs.room.room_type = room_type.clone();
            rs.room.price_per_night = *price_per_night;
            rs.room.status = *status;
        }
        Event::ReservationCreated { reservation } => {
            reservation_index.insert(reservation.id, reservation.room_id);
            rs.insert_reservation(reservation.clone());
        }
        Event::ReservationCheckedIn {
            id,
            at,
            total_amount,
            room_status,
            ..
        } => {
            if let Some(r) = rs.reservation_mut(*id) {
                r.status = ReservationStatus::CheckedIn;
                r.actual_check_in = Some(*at);
                r.total_amount = *total_amount;
            }
            rs.room.status = *room_status;
        }
        Event::ReservationCheckedOut {
            id,
            at,
            total_amount,
            room_status,
            ..
        } => {
            if let Some(r) = rs.reservation_mut(*id) {
                r.status = ReservationStatus::CheckedOut;
                r.actual_check_out = Some(*at);
                r.total_amount = *total_amount;
            }
            rs.room.status = *room_status;
        }
        Event::ReservationCancelled { id, room_status, .. } => {
            if let Some(r) = rs.reservation_mut(*id) {
                r.status = ReservationStatus::Cancelled;
            }
            rs.room.status = *room_status;
        }
        // Room/staff creation and deletion are handled at the map level, not here
        Event::RoomCreated { .. }
        | Event::RoomDeleted { .. }
        | Event::StaffCreated { .. }
        | Event::StaffDeleted { .. } => {}
    }
}

impl Engine {
    pub fn new(wal_path: PathBuf) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            rooms: DashMap::new(),
            reservation_index: DashMap::new(),
            room_numbers: DashMap::new(),
            staff: DashMap::new(),
            usernames: DashMap::new(),
            wal_tx,
        };

        // Replay events — we're the sole owner of these Arcs, so try_write
        // always succeeds instantly (no contention). Never use blocking_write
        // here because this runs inside an async context.
        for event in &events {
            match event {
                Event::RoomCreated { room } => {
                    engine.room_numbers.insert(room.number, room.id);
                    engine
                        .rooms
                        .insert(room.id, Arc::new(RwLock::new(RoomState::new(room.clone()))));
                }
                Event::RoomUpdated { id, number, .. } => {
                    if let Some(entry) = engine.rooms.get(id) {
                        let rs_arc = entry.value().clone();
                        let mut guard = rs_arc.try_write().expect("replay: uncontended write");
                        if guard.room.number != *number {
                            engine.room_numbers.remove(&guard.room.number);
                            engine.room_numbers.insert(*number, *id);
                        }
                        apply_to_room(&mut guard, event, &engine.reservation_index);
                    }
                }
                Event::RoomDeleted { id } => {
                    if let Some((_, rs)) = engine.rooms.remove(id) {
                        let guard = rs.try_read().expect("replay: uncontended read");
                        engine.room_numbers.remove(&guard.room.number);
                        for r in &guard.reservations {
                            engine.reservation_index.remove(&r.id);
                        }
                    }
                }
                Event::StaffCreated { staff } => {
                    engine.usernames.insert(staff.username.clone(), staff.id);
                    engine.staff.insert(staff.id, staff.clone());
                }
                Event::StaffDeleted { id } => {
                    if let Some((_, member)) = engine.staff.remove(id) {
                        engine.usernames.remove(&member.username);
                    }
                }
                other => {
                    if let Some(room_id) = event_room_id(other)
                        && let Some(entry) = engine.rooms.get(&room_id)
                    {
                        let rs_arc = entry.value().clone();
                        let mut guard = rs_arc.try_write().expect("replay: uncontended write");
                        apply_to_room(&mut guard, other, &engine.reservation_index);
                    }
                }
            }
        }

        Ok(engine)
    }

    /// Write event to WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn get_room(&self, id: &Ulid) -> Option<SharedRoomState> {
        self.rooms.get(id).map(|e| e.value().clone())
    }

    pub fn room_id_for_reservation(&self, reservation_id: &Ulid) -> Option<Ulid> {
        self.reservation_index.get(reservation_id).map(|e| *e.value())
    }

    /// WAL-append + apply in one call. The caller holds the room's write lock,
    /// so nothing observes the in-memory state between the two steps.
    pub(super) async fn persist_and_apply(
        &self,
        rs: &mut RoomState,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        apply_to_room(rs, event, &self.reservation_index);
        Ok(())
    }

    /// Lookup reservation → room, get room, acquire write lock.
    pub(super) async fn resolve_reservation_write(
        &self,
        reservation_id: &Ulid,
    ) -> Result<(Ulid, tokio::sync::OwnedRwLockWriteGuard<RoomState>), EngineError> {
        let room_id = self
            .room_id_for_reservation(reservation_id)
            .ok_or(EngineError::NotFound(*reservation_id))?;
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.write_owned().await;
        Ok((room_id, guard))
    }

    /// Compact the WAL by rewriting it with only the events needed to recreate
    /// the current state: one StaffCreated per account, one RoomCreated per
    /// room, one ReservationCreated per reservation (records carry their full
    /// lifecycle state, so no transition events are needed).
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let mut events = Vec::new();

        for entry in self.staff.iter() {
            events.push(Event::StaffCreated {
                staff: entry.value().clone(),
            });
        }

        let room_ids: Vec<Ulid> = self.rooms.iter().map(|e| *e.key()).collect();
        for id in room_ids {
            let Some(rs) = self.get_room(&id) else { continue };
            let guard = rs.read().await;
            events.push(Event::RoomCreated {
                room: guard.room.clone(),
            });
            for r in &guard.reservations {
                events.push(Event::ReservationCreated {
                    reservation: r.clone(),
                });
            }
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}

/// Extract the room id from a room-scoped event (None for room/staff map-level events).
fn event_room_id(event: &Event) -> Option<Ulid> {
    match event {
        Event::ReservationCreated { reservation } => Some(reservation.room_id),
        Event::ReservationCheckedIn { room_id, .. }
        | Event::ReservationCheckedOut { room_id, .. }
        | Event::ReservationCancelled { room_id, .. } => Some(*room_id),
        Event::RoomUpdated { id, .. } => Some(*id),
        Event::RoomCreated { .. }
        | Event::RoomDeleted { .. }
        | Event::StaffCreated { .. }
        | Event::StaffDeleted { .. } => None,
    }
}
