use lazy_static::lazy_static;
use prometheus::{opts, register_counter_vec, CounterVec};

macro_rules! PREFIX {
    () => {
        "market_"
    };
}

lazy_static! {
    pub static ref SUBMITTED_BIDS_COUNT: CounterVec = {
        register_counter_vec!(
            opts!(
                concat!(PREFIX!(), "submitted_bids"),
                "Number of bids accepted into the ledger."
            ),
            &["rfq_id"],
        )
        .unwrap()
    };
    pub static ref AWARDED_RFQS_COUNT: CounterVec = {
        register_counter_vec!(
            opts!(
                concat!(PREFIX!(), "awarded_rfqs"),
                "Number of RFQs awarded to a winning bid."
            ),
            &["rfq_id"],
        )
        .unwrap()
    };
    pub static ref FAILED_AWARDS_COUNT: CounterVec = {
        register_counter_vec!(
            opts!(
                concat!(PREFIX!(), "failed_awards"),
                "Number of award attempts that ended in a typed failure."
            ),
            &["rfq_id"],
        )
        .unwrap()
    };
    pub static ref EXPIRED_RFQS_COUNT: CounterVec = {
        register_counter_vec!(
            opts!(
                concat!(PREFIX!(), "expired_rfqs"),
                "Number of RFQs expired by the background sweep."
            ),
            &[],
        )
        .unwrap()
    };
}
