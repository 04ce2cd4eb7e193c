// Diesel table definitions for the disclosure store.
// Kept in sync by hand with `DieselDbContext::init_schema`.

diesel::table! {
    entities (cert_number) {
        cert_number -> BigInt,
        bank_name -> Nullable<Text>,
        city -> Nullable<Text>,
        state -> Nullable<Text>,
    }
}

diesel::table! {
    filings (disclosure_id) {
        disclosure_id -> BigInt,
        cert_number -> BigInt,
        last_name -> Nullable<Text>,
        first_name -> Nullable<Text>,
        middle -> Nullable<Text>,
        form_type -> Nullable<Text>,
        filing_date -> Nullable<Text>,
        url -> Nullable<Text>,
    }
}

diesel::table! {
    filing_info (disclosure_id, info_number) {
        disclosure_id -> BigInt,
        info_number -> Integer,
        issuer_name -> Nullable<Text>,
        issuer_ticker -> Nullable<Text>,
        report_date -> Nullable<Text>,
        amendment_date -> Nullable<Text>,
        exit_filing -> Nullable<Bool>,
    }
}

diesel::table! {
    filer_info (disclosure_id, info_number) {
        disclosure_id -> BigInt,
        info_number -> Integer,
        title -> Nullable<Text>,
        name -> Nullable<Text>,
        city -> Nullable<Text>,
        state -> Nullable<Text>,
        street -> Nullable<Text>,
        zip -> Nullable<Text>,
    }
}

diesel::table! {
    trades (disclosure_id, trade_number) {
        disclosure_id -> BigInt,
        trade_number -> Integer,
        derivative -> Bool,
        security -> Nullable<Text>,
        trade_date -> Nullable<Text>,
        exec_date -> Nullable<Text>,
        code -> Nullable<Text>,
        v_flag -> Bool,
        trade_shares -> Nullable<BigInt>,
        trade_acq -> Nullable<Bool>,
        trade_price -> Nullable<Double>,
        shares_owned -> Nullable<BigInt>,
        direct_own -> Nullable<Bool>,
        nature_of_own -> Nullable<Text>,
        exercise_price -> Nullable<Double>,
        exercise_date -> Nullable<Text>,
        expire_date -> Nullable<Text>,
        underlying_security -> Nullable<Text>,
        underlying_shares -> Nullable<BigInt>,
    }
}

diesel::table! {
    notes (disclosure_id, note_number) {
        disclosure_id -> BigInt,
        note_number -> Integer,
        footnote -> Text,
    }
}

diesel::joinable!(filings -> entities (cert_number));
diesel::joinable!(filing_info -> filings (disclosure_id));
diesel::joinable!(filer_info -> filings (disclosure_id));
diesel::joinable!(trades -> filings (disclosure_id));
diesel::joinable!(notes -> filings (disclosure_id));

diesel::allow_tables_to_appear_in_same_query!(
    entities,
    filings,
    filing_info,
    filer_info,
    trades,
    notes,
);
