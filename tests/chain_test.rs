//! Unit tests for the chain database lifecycle

mod common;

use common::{Harness, ScriptedRule, signature_output, ticket_purchase};
use std::sync::Arc;
use tombola::chain::ChainError;
use tombola::validator::ValidationError;
use tombola::{
    Address, Asset, BaseLedger, COIN, ClaimTicketOutput, Keypair, OutputIndex, OutputRef,
    PoolShareRule,
};

/// Chain carried through a full settlement: a 5-coin ticket bought at
/// block 1 wins 2 coins at the block 101 draw, paid out in block 102.
fn settled_chain() -> (Harness, Keypair, OutputRef) {
    let mut h = Harness::new(Arc::new(ScriptedRule {
        draw: 101,
        ticket_payout: 2 * COIN,
    }));
    h.advance(Vec::new()).unwrap(); // block 0

    let kp = Keypair::generate();
    let funding = h.credit(signature_output(&kp, 5 * COIN), 0);
    let tx = ticket_purchase(funding, &kp, 0xFACE, 5 * COIN, 0);
    let ticket_ref = OutputRef {
        tx_id: tx.id().unwrap(),
        index: 0,
    };
    h.advance(vec![tx]).unwrap(); // block 1
    h.advance_many(100); // through the draw at block 101
    h.advance(Vec::new()).unwrap(); // block 102 carries the settlement
    (h, kp, ticket_ref)
}

#[test]
fn test_store_rejects_out_of_order() {
    let mut h = Harness::new(Arc::new(PoolShareRule::default()));
    h.advance(Vec::new()).unwrap(); // block 0

    let block = h.next_block(Vec::new());
    let state = h.db.validate(&block, &[]).unwrap();

    let mut skipped = block.clone();
    skipped.header.block_num = 5;
    let err = h.db.store(&skipped, &[], &state).unwrap_err();
    assert!(matches!(
        err,
        ChainError::OutOfOrder {
            expected: 1,
            got: 5
        }
    ));

    // the proper candidate still stores
    h.db.store(&block, &[], &state).unwrap();
    h.delegate.commit();
    assert_eq!(h.db.head_block_num().unwrap(), Some(1));
}

#[test]
fn test_validate_does_not_mutate() {
    let mut h = Harness::new(Arc::new(PoolShareRule::default()));
    h.advance_many(2);

    let block = h.next_block(Vec::new());
    for _ in 0..3 {
        h.db.validate(&block, &[]).unwrap();
    }
    assert_eq!(h.db.head_block_num().unwrap(), Some(1));
    assert!(h.db.block_summary(2).unwrap().is_none());
    assert_eq!(h.db.delegate_blocks(7).unwrap(), vec![0, 1]);

    let state = h.db.validate(&block, &[]).unwrap();
    h.db.store(&block, &[], &state).unwrap();
    assert_eq!(h.db.head_block_num().unwrap(), Some(2));
}

#[test]
fn test_pop_block_restores_prior_state() {
    let (mut h, _, ticket_ref) = settled_chain();
    assert_eq!(h.db.head_block_num().unwrap(), Some(102));
    assert_eq!(
        h.db.drawing_record(101).unwrap().unwrap().total_paid,
        2 * COIN
    );
    assert!(!h.db.base().contains_output(&ticket_ref));

    let popped = h.db.pop_block().unwrap();
    assert_eq!(popped.header.block_num, 102);

    // derived records are exactly as before block 102
    assert_eq!(h.db.head_block_num().unwrap(), Some(101));
    assert!(h.db.block_summary(102).unwrap().is_none());
    assert!(h.db.drawing_record(102).unwrap().is_none());
    assert_eq!(h.db.drawing_record(101).unwrap().unwrap().total_paid, 0);
    assert!(!h.db.delegate_blocks(7).unwrap().contains(&102));

    // the settled ticket is spendable again
    assert!(h.db.base().contains_output(&ticket_ref));
}

#[test]
fn test_pop_then_replay_stores_identically() {
    let (mut h, _, _) = settled_chain();
    let record_before = h.db.drawing_record(101).unwrap().unwrap();

    h.db.pop_block().unwrap();
    h.delegate.uncommit();

    // the same settlement regenerates and the block stores again
    let (block, settlements) = h.advance(Vec::new()).unwrap();
    assert_eq!(block.header.block_num, 102);
    assert_eq!(settlements.len(), 1);
    assert_eq!(h.db.drawing_record(101).unwrap().unwrap(), record_before);
    assert_eq!(
        h.db.block_summary(102).unwrap().unwrap().amount_won,
        2 * COIN
    );
}

#[test]
fn test_pop_empty_chain_fails() {
    let mut h = Harness::new(Arc::new(PoolShareRule::default()));
    assert!(matches!(
        h.db.pop_block().unwrap_err(),
        ChainError::EmptyChain
    ));
}

#[test]
fn test_pop_requires_matching_base_head() {
    let (mut h, _, _) = settled_chain();
    // the base pops one block ahead of the lottery store
    h.db.base_mut().pop_block().unwrap();

    let err = h.db.pop_block().unwrap_err();
    assert!(matches!(
        err,
        ChainError::HeadMismatch {
            head: 102,
            got: 101
        }
    ));

    // the refused pop must not widen the divergence
    assert_eq!(h.db.base().head_block_num(), Some(101));
    assert_eq!(h.db.head_block_num().unwrap(), Some(102));
}

#[test]
fn test_jackpot_query_resolves_after_draw() {
    let (h, kp, _) = settled_chain();
    let source = OutputIndex {
        block_num: 1,
        tx_idx: 1,
        output_idx: 0,
    };
    let ticket = ClaimTicketOutput {
        lucky_number: 0xFACE,
        owner: Address::from_public_key(&kp.public),
        odds: 1,
    };
    let payout = h
        .db
        .jackpot_for_ticket(source, &ticket, Asset::votes(5 * COIN))
        .unwrap();
    assert_eq!(payout, Asset::votes(2 * COIN));
}

#[test]
fn test_jackpot_query_rejects_unresolved_draw() {
    let mut h = Harness::new(Arc::new(PoolShareRule::default()));
    h.advance_many(2);

    let source = OutputIndex {
        block_num: 1,
        tx_idx: 1,
        output_idx: 0,
    };
    let ticket = ClaimTicketOutput {
        lucky_number: 1,
        owner: Address([1u8; 20]),
        odds: 1,
    };
    let err = h
        .db
        .jackpot_for_ticket(source, &ticket, Asset::votes(COIN))
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::Validation(ValidationError::TicketNotMature(1))
    ));
}
