//! Bill arithmetic: GST on the base amount, untaxed additional charges,
//! schedule advancement. All amounts are minor units.

use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::SocietyError;
use crate::models::{new_id, Bill, BillStatus, Charge, FlatDetails, Frequency, ScheduledBill, Society};

/// 100% in basis points.
pub const MAX_GST_RATE_BP: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    #[error("GST rate {0} bp is above 100%")]
    RateTooHigh(u32),
    #[error("bill amount overflows")]
    Overflow,
    #[error("date out of range")]
    DateOutOfRange,
}

impl From<BillingError> for SocietyError {
    fn from(err: BillingError) -> Self {
        SocietyError::unprocessable(err.to_string())
    }
}

impl BillingError {
    pub fn into_anyhow(self) -> anyhow::Error {
        SocietyError::from(self).into_anyhow()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillBreakdown {
    pub base_amount: u64,
    pub gst_rate_bp: u32,
    pub gst_amount: u64,
    pub additional_total: u64,
    pub total: u64,
}

/// `base × rate / 10000`, rounded half up.
pub fn gst_amount(base: u64, rate_bp: u32) -> Result<u64, BillingError> {
    if rate_bp > MAX_GST_RATE_BP {
        return Err(BillingError::RateTooHigh(rate_bp));
    }
    let scaled = u128::from(base) * u128::from(rate_bp);
    let divisor = u128::from(MAX_GST_RATE_BP);
    let rounded = (scaled + divisor / 2) / divisor;
    u64::try_from(rounded).map_err(|_| BillingError::Overflow)
}

pub fn compute(base: u64, rate_bp: u32, charges: &[Charge]) -> Result<BillBreakdown, BillingError> {
    let gst = gst_amount(base, rate_bp)?;
    let additional_total = charges
        .iter()
        .try_fold(0u64, |acc, c| acc.checked_add(c.amount))
        .ok_or(BillingError::Overflow)?;
    let total = base
        .checked_add(gst)
        .and_then(|t| t.checked_add(additional_total))
        .ok_or(BillingError::Overflow)?;

    Ok(BillBreakdown {
        base_amount: base,
        gst_rate_bp: rate_bp,
        gst_amount: gst,
        additional_total,
        total,
    })
}

pub fn due_date(issued: NaiveDate, due_in_days: u32) -> Result<NaiveDate, BillingError> {
    issued
        .checked_add_days(Days::new(u64::from(due_in_days)))
        .ok_or(BillingError::DateOutOfRange)
}

/// The run after `from`, on `billing_day` of the target month or that
/// month's last day if it is shorter. A clamped run does not pull later runs
/// off the billing day.
pub fn advance(from: NaiveDate, frequency: Frequency, billing_day: u32) -> Result<NaiveDate, BillingError> {
    let month = from
        .with_day(1)
        .and_then(|d| d.checked_add_months(Months::new(frequency.months())))
        .ok_or(BillingError::DateOutOfRange)?;
    let last_day = month
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or(BillingError::DateOutOfRange)?
        .day();
    month
        .with_day(billing_day.clamp(1, last_day))
        .ok_or(BillingError::DateOutOfRange)
}

/// Everything about a bill except the flat it is addressed to.
#[derive(Debug, Clone)]
pub struct BillDraft<'a> {
    pub title: &'a str,
    pub base_amount: u64,
    pub gst_rate_bp: u32,
    pub additional_charges: &'a [Charge],
    pub due_date: NaiveDate,
    pub scheduled_bill_id: Option<&'a str>,
}

impl BillDraft<'_> {
    pub fn issue(&self, society_id: &str, flat: FlatDetails, resident_ids: Vec<String>) -> Result<Bill, BillingError> {
        let b = compute(self.base_amount, self.gst_rate_bp, self.additional_charges)?;
        Ok(Bill {
            id: new_id("bill"),
            society_id: society_id.to_string(),
            title: self.title.to_string(),
            flat,
            resident_ids,
            base_amount: b.base_amount,
            gst_rate_bp: b.gst_rate_bp,
            gst_amount: b.gst_amount,
            additional_charges: self.additional_charges.to_vec(),
            total: b.total,
            due_date: self.due_date,
            status: BillStatus::Unpaid,
            scheduled_bill_id: self.scheduled_bill_id.map(str::to_string),
            created_at: Utc::now(),
            paid_at: None,
            paid_by: None,
        })
    }
}

impl ScheduledBill {
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.active && self.next_run <= today
    }

    /// Issue one bill per occupied flat of `society`, dated `today`, then
    /// move `next_run` one period forward. Nothing changes on error.
    pub fn generate(&mut self, society: &Society, today: NaiveDate) -> Result<Vec<Bill>, BillingError> {
        let next_run = advance(self.next_run, self.frequency, self.billing_day)?;
        let draft = BillDraft {
            title: &self.title,
            base_amount: self.base_amount,
            gst_rate_bp: self.gst_rate_bp,
            additional_charges: &self.additional_charges,
            due_date: due_date(today, self.due_in_days)?,
            scheduled_bill_id: Some(&self.id),
        };

        let bills = society
            .apartment_structure
            .occupied_flats()
            .into_iter()
            .map(|(flat, residents)| draft.issue(&society.id, flat, residents))
            .collect::<Result<Vec<_>, _>>()?;

        self.last_run = Some(today);
        self.next_run = next_run;
        Ok(bills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge(label: &str, amount: u64) -> Charge {
        Charge {
            label: label.into(),
            amount,
        }
    }

    #[test]
    fn gst_rounds_half_up() {
        // 18% of 333 = 59.94 → 60
        assert_eq!(gst_amount(333, 1800), Ok(60));
        // 5% of 10 = 0.5 → 1
        assert_eq!(gst_amount(10, 500), Ok(1));
        // 5% of 9 = 0.45 → 0
        assert_eq!(gst_amount(9, 500), Ok(0));
        assert_eq!(gst_amount(250_000, 0), Ok(0));
    }

    #[test]
    fn charges_are_added_untaxed() {
        let b = compute(
            250_000,
            1800,
            &[charge("Parking", 50_000), charge("Club house", 10_000)],
        )
        .unwrap();
        assert_eq!(b.gst_amount, 45_000);
        assert_eq!(b.additional_total, 60_000);
        assert_eq!(b.total, 355_000);
    }

    #[test]
    fn rate_above_hundred_percent_is_rejected() {
        assert_eq!(compute(100, 10_001, &[]), Err(BillingError::RateTooHigh(10_001)));
        assert!(compute(100, 10_000, &[]).is_ok());
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            compute(u64::MAX, 0, &[charge("x", 1)]),
            Err(BillingError::Overflow)
        );
    }

    fn schedule(society: &Society) -> ScheduledBill {
        ScheduledBill {
            id: "sched:1".into(),
            society_id: society.id.clone(),
            title: "Maintenance".into(),
            base_amount: 250_000,
            gst_rate_bp: 1800,
            additional_charges: vec![charge("Sinking fund", 10_000)],
            frequency: Frequency::Quarterly,
            next_run: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            billing_day: 1,
            due_in_days: 10,
            active: true,
            last_run: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn generate_bills_every_occupied_flat_and_advances() {
        let mut society = Society::new("soc-1", "Green Acres");
        society.admit_resident(&FlatDetails::new("A", 1, "101"), "r1").unwrap();
        society.admit_resident(&FlatDetails::new("A", 1, "101"), "r2").unwrap();
        society.admit_resident(&FlatDetails::new("B", 3, "302"), "r3").unwrap();
        society
            .apartment_structure
            .upsert_block(&crate::structure::BlockLayout {
                block_name: "C".into(),
                structure_type: None,
                floors: vec![vec!["C-1".into()]],
            })
            .unwrap();

        let mut sched = schedule(&society);
        let today = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        assert!(sched.is_due(today));

        let bills = sched.generate(&society, today).unwrap();
        assert_eq!(bills.len(), 2);
        assert_eq!(bills[0].flat.flat_number, "101");
        assert_eq!(bills[0].resident_ids, vec!["r1".to_string(), "r2".to_string()]);
        assert_eq!(bills[0].total, 250_000 + 45_000 + 10_000);
        assert_eq!(bills[0].due_date, NaiveDate::from_ymd_opt(2024, 4, 12).unwrap());
        assert_eq!(bills[1].scheduled_bill_id.as_deref(), Some("sched:1"));

        assert_eq!(sched.next_run, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(sched.last_run, Some(today));
        assert!(!sched.is_due(today));
    }

    #[test]
    fn failed_generation_leaves_schedule_untouched() {
        let mut society = Society::new("soc-1", "Green Acres");
        society.admit_resident(&FlatDetails::new("A", 1, "101"), "r1").unwrap();
        let mut sched = schedule(&society);
        sched.gst_rate_bp = 20_000;
        let before = sched.clone();

        let today = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        assert_eq!(sched.generate(&society, today), Err(BillingError::RateTooHigh(20_000)));
        assert_eq!(sched, before);
    }

    #[test]
    fn schedules_advance_by_calendar_months() {
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            advance(jan31, Frequency::Monthly, 31),
            Ok(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert_eq!(
            advance(jan31, Frequency::Quarterly, 31),
            Ok(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap())
        );
        assert_eq!(
            advance(jan31, Frequency::Yearly, 31),
            Ok(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap())
        );
        assert_eq!(
            due_date(jan31, 15),
            Ok(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap())
        );
    }

    #[test]
    fn month_end_schedules_return_to_their_billing_day() {
        let mut society = Society::new("soc-1", "Green Acres");
        society.admit_resident(&FlatDetails::new("A", 1, "101"), "r1").unwrap();
        let mut sched = schedule(&society);
        sched.frequency = Frequency::Monthly;
        sched.next_run = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        sched.billing_day = 31;

        let mut runs = Vec::new();
        for _ in 0..3 {
            let today = sched.next_run;
            sched.generate(&society, today).unwrap();
            runs.push(sched.next_run);
        }
        assert_eq!(
            runs,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            ]
        );
    }
}
