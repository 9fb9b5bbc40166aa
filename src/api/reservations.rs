// api/reservations.rs
//
// Reservation lifecycle: booking, edits, approval queue, completion,
// cancellation with optional no-show penalty, and the printable voucher.
//
// Every reservation carries one `debit` ledger entry referencing it while it
// is live. Edits re-post that entry; cancelling and deleting remove it.
use astra::Request;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::api::company::current_rates;
use crate::api::{path_id, read_json, read_json_or_default, Query};
use crate::auth::{Action, Module, Principal, Role};
use crate::db::cari::{get_cari, munferit_id};
use crate::db::companies::get_company;
use crate::db::notifications::{insert_notification, NewNotification, NotificationKind};
use crate::db::reservations::{
    delete_reservation, get_reservation, insert_reservation, list_reservations, mark_cancelled,
    new_voucher_code, set_pickup_time, set_status, update_reservation, CancelRecord,
    ReservationFilter, ReservationRecord,
};
use crate::db::tour_types::get_tour_type;
use crate::db::transactions::{delete_referenced, insert_transaction};
use crate::domain::cancellation::CancelRequest;
use crate::domain::ledger::{
    Transaction, TransactionInput, TransactionType, REFERENCE_NO_SHOW, REFERENCE_RESERVATION,
};
use crate::domain::payment::PaymentDraft;
use crate::domain::reservation::{
    payment_badge, PaymentBadge, Reservation, ReservationInput, ReservationStatus,
};
use crate::domain::validation::{non_empty, FieldError, Validator};
use crate::errors::ServerError;
use crate::responses::{created_json, html_response, message_json, ok_json, ResultResp};
use crate::router::AppState;
use crate::templates;

/// A reservation as the list and detail endpoints return it.
#[derive(Debug, Serialize)]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub payment_badge: Option<PaymentBadge>,
    pub payment_badge_label: Option<&'static str>,
    pub payment_action: Option<&'static str>,
}

impl From<Reservation> for ReservationView {
    fn from(reservation: Reservation) -> Self {
        let badge = payment_badge(&reservation);
        Self {
            reservation,
            payment_badge: badge,
            payment_badge_label: badge.map(PaymentBadge::label),
            payment_action: badge.and_then(PaymentBadge::action),
        }
    }
}

pub(crate) fn views(reservations: Vec<Reservation>) -> Vec<ReservationView> {
    reservations.into_iter().map(ReservationView::from).collect()
}

/// Fetches a reservation the caller may see. Cari users only see their own.
fn visible(conn: &Connection, who: &Principal, id: i64) -> Result<Reservation, ServerError> {
    let r = get_reservation(conn, who.company_id(), id)?
        .ok_or_else(|| ServerError::not_found("reservation"))?;
    if who.role() == Role::Cari && who.user.cari_id != Some(r.cari_id) {
        return Err(ServerError::not_found("reservation"));
    }
    Ok(r)
}

fn unknown(field: &str, what: &str) -> ServerError {
    ServerError::Validation(vec![FieldError::new(field, format!("unknown {what}"))])
}

/// Resolves an input against stored state into the full column set.
///
/// `base` is the stored reservation when editing; its values fill any field
/// the input leaves out.
fn build_record(
    conn: &Connection,
    app: &AppState,
    who: &Principal,
    input: &ReservationInput,
    base: Option<&Reservation>,
    status: ReservationStatus,
) -> Result<ReservationRecord, ServerError> {
    let company_id = who.company_id();
    let now = app.now();

    let cari_id = match (who.role(), input.cari_id, base) {
        (Role::Cari, _, _) => who
            .user
            .cari_id
            .ok_or_else(|| ServerError::Forbidden("cari user without a cari account".into()))?,
        (_, Some(id), _) => id,
        (_, None, Some(b)) => b.cari_id,
        (_, None, None) => munferit_id(conn, company_id, now)?,
    };
    let cari = get_cari(conn, company_id, cari_id)?.ok_or_else(|| unknown("cari_id", "cari account"))?;

    let tour_type_id = input.tour_type_id.or(base.and_then(|b| b.tour_type_id));
    let tour = match tour_type_id {
        Some(id) => Some(get_tour_type(conn, company_id, id)?.ok_or_else(|| unknown("tour_type_id", "tour type"))?),
        None => None,
    };

    let currency = input
        .currency
        .or(base.map(|b| b.currency))
        .or(tour.as_ref().map(|t| t.default_currency))
        .unwrap_or_default();
    let exchange_rate = match (input.exchange_rate, base) {
        (Some(rate), _) => rate,
        (None, Some(b)) if b.currency == currency => b.exchange_rate,
        _ => current_rates(conn, company_id, app.config.rates.fallback)?.rate(currency),
    };

    let pick = |new: &Option<String>, old: Option<&Option<String>>| match new {
        Some(v) => non_empty(Some(v.clone())),
        None => old.cloned().flatten(),
    };

    let mut pickup_location = pick(&input.pickup_location, base.map(|b| &b.pickup_location));
    let mut pickup_maps_link = pick(&input.pickup_maps_link, base.map(|b| &b.pickup_maps_link));
    if base.is_none() {
        pickup_location = pickup_location.or_else(|| cari.pickup_location.clone());
        pickup_maps_link = pickup_maps_link.or_else(|| cari.pickup_maps_link.clone());
    }

    Ok(ReservationRecord {
        cari_id,
        customer_name: input
            .customer_name
            .as_deref()
            .map(|n| n.trim().to_string())
            .or(base.map(|b| b.customer_name.clone()))
            .unwrap_or_default(),
        customer_contact: pick(&input.customer_contact, base.map(|b| &b.customer_contact)),
        customer_details: input
            .customer_details
            .clone()
            .or(base.and_then(|b| b.customer_details.clone())),
        date: input
            .date
            .clone()
            .or(base.map(|b| b.date.clone()))
            .unwrap_or_default()
            .trim()
            .to_string(),
        time: input
            .time
            .clone()
            .or(base.map(|b| b.time.clone()))
            .unwrap_or_default()
            .trim()
            .to_string(),
        tour_type_id,
        tour_type_name: tour.map(|t| t.name),
        person_count: input.person_count.or(base.map(|b| b.person_count)).unwrap_or(1),
        atv_count: input.atv_count.or(base.map(|b| b.atv_count)).unwrap_or(1),
        pickup_location,
        pickup_maps_link,
        price: input.price.or(base.map(|b| b.price)).unwrap_or(0.0),
        currency,
        exchange_rate,
        notes: pick(&input.notes, base.map(|b| &b.notes)),
        status,
    })
}

/// Posts the reservation's debit against its cari.
fn post_debit(
    conn: &Connection,
    app: &AppState,
    who: &Principal,
    r: &Reservation,
) -> Result<(), ServerError> {
    if r.price <= 0.0 || r.status == ReservationStatus::Cancelled {
        return Ok(());
    }
    let mut payment = PaymentDraft::cash(r.price, r.currency);
    payment.description = Some(format!("Reservation {}", r.voucher_code));
    let input = TransactionInput {
        cari_id: r.cari_id,
        transaction_type: TransactionType::Debit,
        payment,
        exchange_rate: r.exchange_rate,
        reference_id: Some(r.id),
        reference_type: Some(REFERENCE_RESERVATION.to_string()),
        date: Some(r.date.clone()),
    };
    insert_transaction(
        conn,
        who.company_id(),
        &input,
        Some(who.user_id()),
        &app.clock.today_iso(),
        app.now(),
    )?;
    Ok(())
}

fn revert_debit(conn: &Connection, who: &Principal, id: i64) -> Result<usize, ServerError> {
    delete_referenced(
        conn,
        who.company_id(),
        REFERENCE_RESERVATION,
        id,
        TransactionType::Debit,
    )
}

/// Creates a reservation inside the caller's transaction or connection.
/// Shared by `POST /reservations` and `POST /bookings`.
pub(crate) fn create_in_tx(
    conn: &Connection,
    app: &AppState,
    who: &Principal,
    input: &ReservationInput,
) -> Result<Reservation, ServerError> {
    input.validate_create()?;

    let status = if who.role() == Role::Cari {
        ReservationStatus::Pending
    } else {
        ReservationStatus::Confirmed
    };
    let record = build_record(conn, app, who, input, None, status)?;
    let voucher_code = new_voucher_code(&mut rand::thread_rng(), app.clock.today());
    let id = insert_reservation(
        conn,
        who.company_id(),
        &record,
        &voucher_code,
        Some(who.user_id()),
        app.now(),
    )?;
    let reservation = get_reservation(conn, who.company_id(), id)?
        .ok_or_else(|| ServerError::DbError("reservation vanished after insert".into()))?;

    post_debit(conn, app, who, &reservation)?;

    if status == ReservationStatus::Pending {
        let message = format!(
            "{} requested {} {} for {}",
            reservation.cari_name, reservation.date, reservation.time, reservation.customer_name
        );
        insert_notification(
            conn,
            who.company_id(),
            &NewNotification {
                kind: NotificationKind::PendingReservation,
                title: "Onay bekleyen rezervasyon",
                message: &message,
                entity_type: Some(REFERENCE_RESERVATION),
                entity_id: Some(id),
            },
            app.now(),
        )?;
    }

    tracing::info!(
        company_id = who.company_id(),
        reservation_id = id,
        status = status.as_str(),
        voucher = %reservation.voucher_code,
        "reservation created"
    );
    Ok(reservation)
}

fn transition(
    r: &Reservation,
    next: ReservationStatus,
) -> Result<(), ServerError> {
    if r.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(ServerError::Conflict(format!(
            "reservation is {} and cannot become {}",
            r.status, next
        )))
    }
}

/// `GET /reservations`
pub fn list(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Reservations, Action::View)?;
    let q = Query::from_request(req);
    let mut filter = ReservationFilter {
        status: q.parse("status")?,
        date: q.date("date")?,
        date_from: q.date("date_from")?,
        date_to: q.date("date_to")?,
        cari_id: q.parse("cari_id")?,
        search: q.text("search"),
    };
    if who.role() == Role::Cari {
        filter.cari_id = who.user.cari_id.or(Some(-1));
    }

    let reservations = app
        .db
        .with_conn(|conn| list_reservations(conn, who.company_id(), &filter))?;
    ok_json(&views(reservations))
}

pub fn get(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Reservations, Action::View)?;
    let id = path_id(id)?;
    let r = app.db.with_conn(|conn| visible(conn, who, id))?;
    ok_json(&ReservationView::from(r))
}

/// `POST /reservations`
pub fn create(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Reservations, Action::Create)?;
    let input: ReservationInput = read_json(req)?;
    let r = app.db.with_tx(|tx| create_in_tx(tx, app, who, &input))?;
    created_json(&ReservationView::from(r))
}

/// `PUT /reservations/{id}`: absent fields keep their value; the debit is
/// re-posted so price and currency changes reach the ledger.
pub fn update(req: &mut Request, app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Reservations, Action::Edit)?;
    let id = path_id(id)?;
    let input: ReservationInput = read_json(req)?;
    input.validate_update()?;

    let r = app.db.with_tx(|tx| {
        let current = visible(tx, who, id)?;
        if current.status.is_terminal() {
            return Err(ServerError::Conflict(format!(
                "{} reservations cannot be edited",
                current.status
            )));
        }
        let record = build_record(tx, app, who, &input, Some(&current), current.status)?;
        update_reservation(tx, who.company_id(), id, &record, app.now())?;
        revert_debit(tx, who, id)?;
        let updated = get_reservation(tx, who.company_id(), id)?
            .ok_or_else(|| ServerError::not_found("reservation"))?;
        post_debit(tx, app, who, &updated)?;
        Ok(updated)
    })?;

    tracing::info!(company_id = who.company_id(), reservation_id = id, "reservation updated");
    ok_json(&ReservationView::from(r))
}

/// `DELETE /reservations/{id}`: removes its debits and unlinks its payments.
pub fn delete(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Reservations, Action::Delete)?;
    let id = path_id(id)?;
    app.db.with_tx(|tx| {
        visible(tx, who, id)?;
        revert_debit(tx, who, id)?;
        delete_referenced(tx, who.company_id(), REFERENCE_NO_SHOW, id, TransactionType::Debit)?;
        delete_reservation(tx, who.company_id(), id)
    })?;
    tracing::info!(company_id = who.company_id(), reservation_id = id, "reservation deleted");
    message_json("reservation deleted")
}

/// `POST /reservations/{id}/complete`
pub fn complete(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Reservations, Action::Edit)?;
    let id = path_id(id)?;
    let r = app.db.with_tx(|tx| {
        let r = visible(tx, who, id)?;
        transition(&r, ReservationStatus::Completed)?;
        set_status(tx, who.company_id(), id, ReservationStatus::Completed, app.now())?;
        get_reservation(tx, who.company_id(), id)?.ok_or_else(|| ServerError::not_found("reservation"))
    })?;
    ok_json(&ReservationView::from(r))
}

/// `GET /reservations/pending`: the approval queue.
pub fn pending(app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Reservations, Action::View)?;
    let mut filter = ReservationFilter {
        status: Some(ReservationStatus::Pending),
        ..Default::default()
    };
    if who.role() == Role::Cari {
        filter.cari_id = who.user.cari_id.or(Some(-1));
    }
    let reservations = app
        .db
        .with_conn(|conn| list_reservations(conn, who.company_id(), &filter))?;
    ok_json(&views(reservations))
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveBody {
    pub pickup_time: Option<String>,
}

/// `POST /reservations/{id}/approve`: a pickup time is mandatory.
pub fn approve(req: &mut Request, app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Reservations, Action::Edit)?;
    let id = path_id(id)?;
    let body: ApproveBody = read_json_or_default(req)?;
    let mut v = Validator::new();
    v.require_text("pickup_time", body.pickup_time.as_deref())
        .time("pickup_time", body.pickup_time.as_deref());
    v.finish()?;
    let pickup_time = body.pickup_time.unwrap_or_default().trim().to_string();

    let r = app.db.with_tx(|tx| {
        let r = visible(tx, who, id)?;
        if r.status != ReservationStatus::Pending {
            return Err(ServerError::Conflict(format!("reservation is {}, not pending", r.status)));
        }
        transition(&r, ReservationStatus::Confirmed)?;
        set_status(tx, who.company_id(), id, ReservationStatus::Confirmed, app.now())?;
        set_pickup_time(tx, who.company_id(), id, &pickup_time, app.now())?;
        get_reservation(tx, who.company_id(), id)?.ok_or_else(|| ServerError::not_found("reservation"))
    })?;

    tracing::info!(company_id = who.company_id(), reservation_id = id, pickup_time = %pickup_time, "reservation approved");
    ok_json(&ReservationView::from(r))
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
    pub reason: Option<String>,
}

/// `POST /reservations/{id}/reject`: cancels a pending request.
pub fn reject(req: &mut Request, app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Reservations, Action::Edit)?;
    let id = path_id(id)?;
    let body: RejectBody = read_json_or_default(req)?;
    let reason = non_empty(body.reason);

    let r = app.db.with_tx(|tx| {
        let r = visible(tx, who, id)?;
        if r.status != ReservationStatus::Pending {
            return Err(ServerError::Conflict(format!("reservation is {}, not pending", r.status)));
        }
        revert_debit(tx, who, id)?;
        let cancel = CancelRecord {
            reason: reason.as_deref(),
            no_show: None,
        };
        mark_cancelled(tx, who.company_id(), id, &cancel, app.now())?;
        get_reservation(tx, who.company_id(), id)?.ok_or_else(|| ServerError::not_found("reservation"))
    })?;

    tracing::info!(company_id = who.company_id(), reservation_id = id, "reservation rejected");
    ok_json(&ReservationView::from(r))
}

/// `PUT /reservations/{id}/cancel`: reverts the debit and, for a no-show,
/// posts the penalty as a debit of its own.
pub fn cancel(req: &mut Request, app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Reservations, Action::Edit)?;
    let id = path_id(id)?;
    let body: CancelRequest = read_json_or_default(req)?;
    body.validate()?;
    let reason = non_empty(body.reason.clone());

    let r = app.db.with_tx(|tx| {
        let r = visible(tx, who, id)?;
        transition(&r, ReservationStatus::Cancelled)?;
        revert_debit(tx, who, id)?;

        let rates = current_rates(tx, who.company_id(), app.config.rates.fallback)?;
        let penalty = body.penalty(&rates);
        if let Some((amount, currency, exchange_rate)) = penalty {
            let mut payment = PaymentDraft::cash(amount, currency);
            payment.description = Some("No-show".to_string());
            let input = TransactionInput {
                cari_id: r.cari_id,
                transaction_type: TransactionType::Debit,
                payment,
                exchange_rate,
                reference_id: Some(id),
                reference_type: Some(REFERENCE_NO_SHOW.to_string()),
                date: Some(app.clock.today_iso()),
            };
            insert_transaction(
                tx,
                who.company_id(),
                &input,
                Some(who.user_id()),
                &app.clock.today_iso(),
                app.now(),
            )?;
        }

        let cancel = CancelRecord {
            reason: reason.as_deref(),
            no_show: penalty.map(|(amount, currency, _)| (amount, currency)),
        };
        mark_cancelled(tx, who.company_id(), id, &cancel, app.now())?;
        get_reservation(tx, who.company_id(), id)?.ok_or_else(|| ServerError::not_found("reservation"))
    })?;

    tracing::info!(
        company_id = who.company_id(),
        reservation_id = id,
        no_show = r.no_show_applied,
        "reservation cancelled"
    );
    ok_json(&ReservationView::from(r))
}

/// `GET /reservations/{id}/voucher`
pub fn voucher(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Reservations, Action::View)?;
    let id = path_id(id)?;
    let (company, r) = app.db.with_conn(|conn| {
        let r = visible(conn, who, id)?;
        let company = get_company(conn, who.company_id())?
            .ok_or_else(|| ServerError::not_found("company"))?;
        Ok((company, r))
    })?;
    html_response(templates::voucher::voucher_page(&company, &r, app.clock.today()))
}

/// Body of `POST /bookings`: the reservation fields plus an optional payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingRequest {
    #[serde(flatten)]
    pub reservation: ReservationInput,
    pub payment: Option<PaymentDraft>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub reservation: ReservationView,
    pub transaction: Option<Transaction>,
}

/// `POST /bookings`: reservation and its payment in one SQLite transaction,
/// so a failure leaves neither behind.
pub fn book(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Reservations, Action::Create)?;
    let body: BookingRequest = read_json(req)?;
    if let Some(payment) = &body.payment {
        who.require(Module::Transactions, Action::Create)?;
        payment.validate()?;
    }

    let (reservation, transaction) = app.db.with_tx(|tx| {
        let created = create_in_tx(tx, app, who, &body.reservation)?;
        let transaction = match &body.payment {
            Some(payment) => {
                let mut input = TransactionInput::payment(
                    created.cari_id,
                    payment.clone(),
                    current_rates(tx, who.company_id(), app.config.rates.fallback)?
                        .rate(payment.currency),
                );
                input.reference_id = Some(created.id);
                input.reference_type = Some(REFERENCE_RESERVATION.to_string());
                Some(insert_transaction(
                    tx,
                    who.company_id(),
                    &input,
                    Some(who.user_id()),
                    &app.clock.today_iso(),
                    app.now(),
                )?)
            }
            None => None,
        };
        let reservation = get_reservation(tx, who.company_id(), created.id)?
            .ok_or_else(|| ServerError::not_found("reservation"))?;
        Ok((reservation, transaction))
    })?;

    created_json(&BookingResponse {
        reservation: ReservationView::from(reservation),
        transaction,
    })
}
