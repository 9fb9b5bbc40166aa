// client/booking.rs
//
// Submit order for the reservation form:
//
//   1. optional payment against the Münferit account (POST /transactions)
//   2. the reservation itself (POST or PUT /reservations)
//   3. the payment is linked to the new reservation (PUT /transactions/{id})
//
// Steps are separate requests. An interruption between them leaves an
// unlinked payment on the Münferit ledger; the server-side `/bookings`
// endpoint exists for callers that need the atomic variant.
use crate::client::api::BackOfficeApi;
use crate::client::form::{FormMode, ReservationForm};
use crate::client::http::ApiError;
use crate::client::toast::Toast;
use crate::domain::currency::ExchangeRates;
use crate::domain::ledger::{Transaction, TransactionInput, TransactionLink};
use crate::domain::payment::PaymentDraft;
use crate::domain::reservation::Reservation;
use crate::domain::validation::Validator;

pub const PAYMENT_MISSING: &str = "⚠️ Ödeme alınmadı";

/// The payment tab. A recorded payment locks the draft for the rest of the
/// form's life.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentTab {
    draft: PaymentDraft,
    recorded: Option<Transaction>,
}

impl PaymentTab {
    pub fn new(draft: PaymentDraft) -> Self {
        Self {
            draft,
            recorded: None,
        }
    }

    pub fn draft(&self) -> &PaymentDraft {
        &self.draft
    }

    /// `None` once the payment has been recorded.
    pub fn draft_mut(&mut self) -> Option<&mut PaymentDraft> {
        match self.recorded {
            Some(_) => None,
            None => Some(&mut self.draft),
        }
    }

    pub fn is_recorded(&self) -> bool {
        self.recorded.is_some()
    }

    pub fn recorded(&self) -> Option<&Transaction> {
        self.recorded.as_ref()
    }

    /// Posts the draft as a payment on the form's Münferit cari.
    pub fn add_payment<A>(
        &mut self,
        api: &A,
        form: &ReservationForm,
        rates: &ExchangeRates,
    ) -> Result<Toast, ApiError>
    where
        A: BackOfficeApi + ?Sized,
    {
        let mut v = Validator::new();
        v.check("payment", self.recorded.is_none(), "payment already recorded")
            .check("cari_id", form.is_munferit, "payments here are for Münferit bookings only")
            .require("cari_id", form.cari_id);
        if let Err(errors) = self.draft.validate() {
            v.extend(errors);
        }
        v.finish().map_err(ApiError::Validation)?;

        let cari_id = form.cari_id.unwrap_or_default();
        let input = TransactionInput::payment(cari_id, self.draft.clone(), rates.rate(self.draft.currency));
        let tx = api.create_transaction(&input)?;
        tracing::info!(
            transaction_id = tx.id,
            cari_id,
            amount = tx.amount,
            currency = %tx.currency,
            "payment recorded before reservation"
        );
        self.recorded = Some(tx);
        Ok(Toast::success("Ödeme kaydedildi"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub reservation: Reservation,
    pub linked_transaction: Option<Transaction>,
    pub toasts: Vec<Toast>,
}

/// Saves the form. Validation runs locally before any request; failures
/// after the reservation is stored come back as warnings, not errors.
pub fn submit<A>(api: &A, form: &ReservationForm, payment: &PaymentTab) -> Result<SubmitOutcome, ApiError>
where
    A: BackOfficeApi + ?Sized,
{
    form.validate().map_err(ApiError::Validation)?;
    let input = form.to_input();

    let (reservation, saved) = match form.mode {
        FormMode::Create => (api.create_reservation(&input)?, "Rezervasyon oluşturuldu"),
        FormMode::Edit(id) => (api.update_reservation(id, &input)?, "Rezervasyon güncellendi"),
    };
    let mut toasts = vec![Toast::success(saved)];
    let mut linked_transaction = None;

    if form.is_munferit {
        match payment.recorded() {
            Some(tx) => match api.link_transaction(tx.id, &TransactionLink::reservation(reservation.id)) {
                Ok(linked) => linked_transaction = Some(linked),
                Err(e) => {
                    tracing::warn!(
                        transaction_id = tx.id,
                        reservation_id = reservation.id,
                        error = %e,
                        "payment could not be linked"
                    );
                    toasts.push(Toast::warning(format!(
                        "Ödeme rezervasyona bağlanamadı: {}",
                        e.user_message()
                    )));
                }
            },
            None if !reservation.has_payment => toasts.push(Toast::warning(PAYMENT_MISSING)),
            None => {}
        }
    }

    Ok(SubmitOutcome {
        reservation,
        linked_transaction,
        toasts,
    })
}

/// Turns a failed step into the single toast the user sees.
pub fn failure_toast(err: &ApiError) -> Toast {
    Toast::error(err.user_message())
}
