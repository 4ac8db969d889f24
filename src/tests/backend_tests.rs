/// Tests for backend wire decoding of loosely typed settings, player
/// records, and play responses.
use rust_decimal_macros::dec;
use serde_json::json;

use crate::backend::{
    coerce_bool, coerce_decimal, coerce_units, AdminSettings, PlayRequest, PlayResponse,
    PlayerRecord,
};
use crate::types::Side;

fn settings(v: serde_json::Value) -> AdminSettings {
    serde_json::from_value(v).unwrap()
}

fn play_response(v: serde_json::Value) -> PlayResponse {
    serde_json::from_value(v).unwrap()
}

// ── admin settings ────────────────────────────────────────────────────────

#[test]
fn settings_decode_from_string_typed_json() {
    let game = settings(json!({
        "winRatio": "45",
        "minBet": "500",
        "maxBet": "100000",
        "payoutMultiplier": "1.9",
        "isTopUpOpen": "true"
    }))
    .into_game_config();
    assert_eq!(game.win_ratio, 45);
    assert_eq!(game.min_bet, 500);
    assert_eq!(game.max_bet, 100_000);
    assert_eq!(game.payout_multiplier, dec!(1.9));
    assert!(game.top_up_open);
}

#[test]
fn settings_decode_from_number_typed_json() {
    let game = settings(json!({
        "winRatio": 55,
        "minBet": 1000,
        "maxBet": 50000,
        "payoutMultiplier": 1.8,
        "isTopUpOpen": false
    }))
    .into_game_config();
    assert_eq!(game.win_ratio, 55);
    assert_eq!(game.min_bet, 1_000);
    assert_eq!(game.max_bet, 50_000);
    assert_eq!(game.payout_multiplier, dec!(1.8));
    assert!(!game.top_up_open);
}

#[test]
fn missing_settings_fall_back_to_dashboard_defaults() {
    let game = settings(json!({})).into_game_config();
    assert_eq!(game.win_ratio, 40);
    assert_eq!(game.min_bet, 500);
    assert_eq!(game.max_bet, 100_000);
    assert_eq!(game.payout_multiplier, dec!(1.8));
    assert!(!game.top_up_open);
}

#[test]
fn garbled_settings_fall_back_too() {
    let game = settings(json!({
        "winRatio": "lots",
        "minBet": null,
        "maxBet": [1, 2],
        "payoutMultiplier": "",
        "isTopUpOpen": "maybe"
    }))
    .into_game_config();
    assert_eq!(game.win_ratio, 40);
    assert_eq!(game.min_bet, 500);
    assert_eq!(game.max_bet, 100_000);
    assert_eq!(game.payout_multiplier, dec!(1.8));
    assert!(!game.top_up_open);
}

#[test]
fn win_ratio_is_clamped_to_100() {
    let game = settings(json!({ "winRatio": 250 })).into_game_config();
    assert_eq!(game.win_ratio, 100);
}

// ── player records ────────────────────────────────────────────────────────

#[test]
fn player_id_reads_numbers_and_strings() {
    let rec: PlayerRecord = serde_json::from_value(json!({ "id": 42 })).unwrap();
    assert_eq!(rec.id(), Some("42".to_string()));
    let rec: PlayerRecord = serde_json::from_value(json!({ "id": "abc-7" })).unwrap();
    assert_eq!(rec.id(), Some("abc-7".to_string()));
    let rec: PlayerRecord = serde_json::from_value(json!({ "name": "aung" })).unwrap();
    assert_eq!(rec.id(), None);
}

#[test]
fn player_balance_rounds_to_whole_units() {
    let rec: PlayerRecord = serde_json::from_value(json!({ "balance": "1234.5" })).unwrap();
    assert_eq!(rec.balance_units(), 1_235);
    let rec: PlayerRecord = serde_json::from_value(json!({ "balance": 50000 })).unwrap();
    assert_eq!(rec.balance_units(), 50_000);
    let rec: PlayerRecord = serde_json::from_value(json!({})).unwrap();
    assert_eq!(rec.balance_units(), 0);
}

#[test]
fn player_snapshot_keeps_the_name_and_the_rounded_balance() {
    let rec: PlayerRecord = serde_json::from_value(json!({
        "id": 42,
        "name": "aung",
        "balance": "12499.5"
    }))
    .unwrap();
    let snapshot = rec.into_snapshot("42".to_string());
    assert_eq!(snapshot.id, "42");
    assert_eq!(snapshot.name.as_deref(), Some("aung"));
    assert_eq!(snapshot.balance, 12_500);
}

// ── play round-trip ───────────────────────────────────────────────────────

#[test]
fn play_request_uses_the_backend_field_names() {
    let request = PlayRequest {
        telegram_id: 123,
        amount: 500,
        choice: Side::High,
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({ "telegramId": 123, "amount": 500, "choice": "HIGH" })
    );
}

#[test]
fn play_response_decodes_string_typed_fields() {
    let resp = play_response(json!({
        "resultNum": "73",
        "newBalance": "51900",
        "isWin": "true",
        "payout": "1900"
    }));
    assert_eq!(resp.result(), 73);
    assert_eq!(resp.landed(), Side::High);
    assert!(resp.won());
    assert_eq!(resp.payout_units(), 1_900);
    assert_eq!(resp.balance_units(), Some(51_900));
}

#[test]
fn play_response_decodes_number_typed_fields() {
    let resp = play_response(json!({
        "resultNum": 12,
        "newBalance": 48100,
        "isWin": false,
        "payout": 0
    }));
    assert_eq!(resp.result(), 12);
    assert_eq!(resp.landed(), Side::Low);
    assert!(!resp.won());
    assert_eq!(resp.payout_units(), 0);
    assert_eq!(resp.balance_units(), Some(48_100));
}

#[test]
fn result_number_splits_at_fifty() {
    let low = play_response(json!({ "resultNum": 49 }));
    assert_eq!(low.landed(), Side::Low);
    let high = play_response(json!({ "resultNum": 50 }));
    assert_eq!(high.landed(), Side::High);
}

#[test]
fn oversized_result_numbers_are_capped() {
    let resp = play_response(json!({ "resultNum": 400 }));
    assert_eq!(resp.result(), 99);
}

#[test]
fn missing_balance_reads_as_unsettled() {
    let resp = play_response(json!({ "resultNum": 73, "isWin": true, "payout": 950 }));
    assert_eq!(resp.balance_units(), None);
}

#[test]
fn default_play_response_reads_as_a_lost_round() {
    let resp = PlayResponse::default();
    assert_eq!(resp.result(), 0);
    assert!(!resp.won());
    assert_eq!(resp.payout_units(), 0);
    assert_eq!(resp.balance_units(), None);
}

// ── field coercions ───────────────────────────────────────────────────────

#[test]
fn units_coerce_from_numbers_and_strings() {
    assert_eq!(coerce_units(&json!(500)), Some(500));
    assert_eq!(coerce_units(&json!("500")), Some(500));
    assert_eq!(coerce_units(&json!(" 500 ")), Some(500));
    assert_eq!(coerce_units(&json!(499.5)), Some(500)); // half-up
    assert_eq!(coerce_units(&json!(-1)), None);
    assert_eq!(coerce_units(&json!(null)), None);
}

#[test]
fn decimals_coerce_with_whitespace_trimmed() {
    assert_eq!(coerce_decimal(&json!("1.9")), Some(dec!(1.9)));
    assert_eq!(coerce_decimal(&json!(" 1.9\n")), Some(dec!(1.9)));
    assert_eq!(coerce_decimal(&json!(1.9)), Some(dec!(1.9)));
    assert_eq!(coerce_decimal(&json!("x")), None);
    assert_eq!(coerce_decimal(&json!(true)), None);
}

#[test]
fn bools_coerce_from_every_backend_spelling() {
    assert_eq!(coerce_bool(&json!(true)), Some(true));
    assert_eq!(coerce_bool(&json!("TRUE")), Some(true));
    assert_eq!(coerce_bool(&json!("1")), Some(true));
    assert_eq!(coerce_bool(&json!("yes")), Some(true));
    assert_eq!(coerce_bool(&json!(false)), Some(false));
    assert_eq!(coerce_bool(&json!("0")), Some(false));
    assert_eq!(coerce_bool(&json!(0)), Some(false));
    assert_eq!(coerce_bool(&json!(2)), Some(true));
    assert_eq!(coerce_bool(&json!("maybe")), None);
}
