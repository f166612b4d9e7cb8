// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use bundle_ledger::{
    database::models::{NewBundle, NewTransaction, NewValidator, TransactionChanges},
    ledger::{
        error::{Entity, LedgerError},
        Ledger, Page,
    },
    types::{Block, Epoch},
};

/// 43 character identifier made of a single repeated character.
pub fn id(c: char) -> String {
    c.to_string().repeat(43)
}

pub fn new_bundle(c: char) -> NewBundle {
    NewBundle {
        id: id(c),
        owner_address: id('o'),
        block_height: Block(1),
    }
}

pub fn new_tx(c: char, epoch: u128, bundle: Option<char>) -> NewTransaction {
    NewTransaction {
        id: id(c),
        epoch: Epoch(epoch),
        block_promised: Block(1000),
        block_actual: None,
        signature: vec![0xde, 0xad, 0xbe, 0xef],
        validated: false,
        bundle_id: bundle.map(id),
    }
}

pub fn new_validator(c: char) -> NewValidator {
    NewValidator {
        address: id(c),
        url: Some(format!("http://{}.validators.example.com:42069", c)),
    }
}

fn tx_ids<L: Ledger>(ledger: &L, epoch: u128) -> Result<Vec<String>> {
    Ok(ledger
        .transactions_by_epoch(Epoch(epoch))?
        .into_iter()
        .map(|tx| tx.id)
        .collect())
}

pub fn bundle_round_trip<L: Ledger>(ledger: &L) -> Result<()> {
    let created = ledger.create_bundle(NewBundle {
        block_height: Block(u128::MAX),
        ..new_bundle('B')
    })?;

    let stored = ledger.get_bundle(&id('B'))?;
    assert_eq!(stored, created);
    assert_eq!(stored.block_height, u128::MAX);
    Ok(())
}

pub fn tx_in_bundle_by_epoch<L: Ledger>(ledger: &L) -> Result<()> {
    ledger.create_bundle(new_bundle('X'))?;
    let created = ledger.create_transaction(new_tx('T', 0, Some('X')))?;

    let found = ledger.transactions_by_epoch("0x00".parse()?)?;
    assert_eq!(found, vec![created.clone()]);
    assert_eq!(ledger.transactions_in_bundle(&id('X'))?, vec![created]);
    Ok(())
}

pub fn tx_with_missing_bundle_is_rejected<L: Ledger>(ledger: &L) -> Result<()> {
    let err = ledger
        .create_transaction(new_tx('T', 0, Some('X')))
        .unwrap_err();

    assert_eq!(
        err,
        LedgerError::foreign_key(Entity::Transaction, Entity::Bundle, &id('X'))
    );
    assert!(ledger.transactions_by_epoch(Epoch(0))?.is_empty());
    assert_eq!(ledger.count_transactions()?, 0);
    Ok(())
}

pub fn leader_requires_validator<L: Ledger>(ledger: &L) -> Result<()> {
    let err = ledger.create_leader(&id('V')).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ForeignKeyViolation {
            entity: Entity::Leader,
            references: Entity::Validator,
            ..
        }
    ));
    assert!(ledger.leaders()?.is_empty());

    ledger.create_validator(new_validator('V'))?;
    let leader = ledger.create_leader(&id('V'))?;
    assert_eq!(ledger.get_leader(&id('V'))?, leader);
    Ok(())
}

pub fn duplicates_are_rejected<L: Ledger>(ledger: &L) -> Result<()> {
    ledger.create_bundle(new_bundle('B'))?;
    ledger.create_transaction(new_tx('T', 3, None))?;
    ledger.create_validator(new_validator('V'))?;
    ledger.create_leader(&id('V'))?;

    assert_eq!(
        ledger.create_bundle(new_bundle('B')).unwrap_err(),
        LedgerError::duplicate(Entity::Bundle, &id('B'))
    );
    assert_eq!(
        ledger.create_transaction(new_tx('T', 4, None)).unwrap_err(),
        LedgerError::duplicate(Entity::Transaction, &id('T'))
    );
    assert_eq!(
        ledger.create_validator(new_validator('V')).unwrap_err(),
        LedgerError::duplicate(Entity::Validator, &id('V'))
    );
    assert_eq!(
        ledger.create_leader(&id('V')).unwrap_err(),
        LedgerError::duplicate(Entity::Leader, &id('V'))
    );

    // the rejected duplicate left the first insert alone
    assert_eq!(ledger.get_transaction(&id('T'))?.epoch, Epoch(3));
    assert!(tx_ids(ledger, 4)?.is_empty());
    Ok(())
}

pub fn epoch_lookup_is_exact<L: Ledger>(ledger: &L) -> Result<()> {
    for (c, epoch) in [('C', 1), ('A', 1), ('B', 2), ('D', 256)] {
        ledger.create_transaction(new_tx(c, epoch, None))?;
    }

    assert_eq!(tx_ids(ledger, 1)?, vec![id('A'), id('C')]);
    assert_eq!(tx_ids(ledger, 2)?, vec![id('B')]);
    assert_eq!(tx_ids(ledger, 256)?, vec![id('D')]);
    assert!(tx_ids(ledger, 0)?.is_empty());
    assert!(tx_ids(ledger, 3)?.is_empty());
    Ok(())
}

pub fn epoch_lookup_pages<L: Ledger>(ledger: &L) -> Result<()> {
    for c in ['A', 'B', 'C', 'D'] {
        ledger.create_transaction(new_tx(c, 9, None))?;
    }
    ledger.create_transaction(new_tx('E', 10, None))?;

    let page = |p: Page| -> Result<Vec<String>> {
        Ok(ledger
            .transactions_by_epoch_after(Epoch(9), &p)?
            .into_iter()
            .map(|tx| tx.id)
            .collect())
    };

    assert_eq!(page(Page::first(2))?, vec![id('A'), id('B')]);
    assert_eq!(page(Page::after(id('B'), 2))?, vec![id('C'), id('D')]);
    assert!(page(Page::after(id('D'), 2))?.is_empty());
    assert!(page(Page::first(0))?.is_empty());
    assert!(matches!(
        ledger.transactions_by_epoch_after(Epoch(9), &Page::first(-3)),
        Err(LedgerError::MalformedInput { field: "limit", .. })
    ));
    Ok(())
}

pub fn update_moves_tx_between_epochs<L: Ledger>(ledger: &L) -> Result<()> {
    ledger.create_bundle(new_bundle('X'))?;
    ledger.create_transaction(new_tx('T', 5, None))?;

    let updated = ledger.update_transaction(
        &id('T'),
        TransactionChanges {
            epoch: Some(Epoch(6)),
            block_actual: Some(Some(Block(1001))),
            validated: Some(true),
            bundle_id: Some(Some(id('X'))),
            ..Default::default()
        },
    )?;

    assert_eq!(updated.epoch, Epoch(6));
    assert_eq!(updated.block_actual, Some(Block(1001)));
    assert!(updated.validated);
    assert_eq!(ledger.get_transaction(&id('T'))?, updated);
    assert!(tx_ids(ledger, 5)?.is_empty());
    assert_eq!(tx_ids(ledger, 6)?, vec![id('T')]);
    assert_eq!(ledger.transactions_in_bundle(&id('X'))?.len(), 1);
    assert!(ledger.unvalidated_transactions()?.is_empty());

    let cleared = ledger.update_transaction(
        &id('T'),
        TransactionChanges {
            bundle_id: Some(None),
            ..Default::default()
        },
    )?;
    assert_eq!(cleared.bundle_id, None);
    assert!(ledger.transactions_in_bundle(&id('X'))?.is_empty());
    Ok(())
}

pub fn update_edge_cases<L: Ledger>(ledger: &L) -> Result<()> {
    let created = ledger.create_transaction(new_tx('T', 5, None))?;

    let unchanged = ledger.update_transaction(&id('T'), TransactionChanges::default())?;
    assert_eq!(unchanged, created);

    let err = ledger
        .update_transaction(
            &id('T'),
            TransactionChanges {
                bundle_id: Some(Some(id('X'))),
                validated: Some(true),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::ForeignKeyViolation { .. }));
    assert_eq!(ledger.get_transaction(&id('T'))?, created);

    let err = ledger
        .update_transaction(&id('U'), TransactionChanges::default())
        .unwrap_err();
    assert_eq!(err, LedgerError::not_found(Entity::Transaction, &id('U')));
    Ok(())
}

pub fn prune_keeps_recent_epochs<L: Ledger>(ledger: &L) -> Result<()> {
    for (c, epoch) in [('A', 0), ('B', 7), ('C', 8), ('D', 9), ('E', 10)] {
        ledger.create_transaction(new_tx(c, epoch, None))?;
    }

    assert_eq!(ledger.prune_transactions(Epoch(10), 3)?, 2);
    assert_eq!(ledger.count_transactions()?, 3);
    assert!(tx_ids(ledger, 0)?.is_empty());
    assert!(tx_ids(ledger, 7)?.is_empty());
    assert_eq!(tx_ids(ledger, 8)?, vec![id('C')]);

    assert_eq!(ledger.prune_transactions(Epoch(10), 0)?, 3);
    assert_eq!(ledger.count_transactions()?, 0);
    Ok(())
}

pub fn prune_frees_bundles<L: Ledger>(ledger: &L) -> Result<()> {
    ledger.create_bundle(new_bundle('X'))?;
    ledger.create_transaction(new_tx('T', 1, Some('X')))?;

    assert!(matches!(
        ledger.delete_bundle(&id('X')),
        Err(LedgerError::ForeignKeyViolation { .. })
    ));

    ledger.prune_transactions(Epoch(50), 10)?;
    ledger.delete_bundle(&id('X'))?;
    assert_eq!(
        ledger.get_bundle(&id('X')).unwrap_err(),
        LedgerError::not_found(Entity::Bundle, &id('X'))
    );
    Ok(())
}

pub fn validator_deletion_is_restricted<L: Ledger>(ledger: &L) -> Result<()> {
    ledger.create_validator(new_validator('V'))?;
    ledger.create_validator(NewValidator {
        address: id('W'),
        url: None,
    })?;
    ledger.create_leader(&id('V'))?;

    assert!(matches!(
        ledger.delete_validator(&id('V')),
        Err(LedgerError::ForeignKeyViolation { .. })
    ));
    ledger.delete_validator(&id('W'))?;
    assert_eq!(ledger.validators()?.len(), 1);

    ledger.delete_leader(&id('V'))?;
    ledger.delete_validator(&id('V'))?;
    assert!(ledger.validators()?.is_empty());
    assert_eq!(
        ledger.delete_leader(&id('V')).unwrap_err(),
        LedgerError::not_found(Entity::Leader, &id('V'))
    );
    Ok(())
}

pub fn malformed_input_is_rejected<L: Ledger>(ledger: &L) -> Result<()> {
    let short = NewBundle {
        id: "abc".to_string(),
        ..new_bundle('B')
    };
    assert!(matches!(
        ledger.create_bundle(short),
        Err(LedgerError::MalformedInput { field: "id", .. })
    ));

    let bad_owner = NewBundle {
        owner_address: format!("{}=", "o".repeat(42)),
        ..new_bundle('B')
    };
    assert!(matches!(
        ledger.create_bundle(bad_owner),
        Err(LedgerError::MalformedInput {
            field: "owner_address",
            ..
        })
    ));

    let long_url = NewValidator {
        url: Some(format!("http://{}.com", "v".repeat(100))),
        ..new_validator('V')
    };
    assert!(matches!(
        ledger.create_validator(long_url),
        Err(LedgerError::MalformedInput { field: "url", .. })
    ));

    assert!(matches!(
        ledger.get_transaction("nope"),
        Err(LedgerError::MalformedInput { .. })
    ));
    assert!(matches!(
        ledger.prune_transactions(Epoch(1), u128::MAX),
        Err(LedgerError::MalformedInput { field: "retain", .. })
    ));

    assert!(ledger.validators()?.is_empty());
    assert_eq!(ledger.count_transactions()?, 0);
    Ok(())
}

pub fn unvalidated_listing<L: Ledger>(ledger: &L) -> Result<()> {
    ledger.create_transaction(new_tx('A', 1, None))?;
    ledger.create_transaction(NewTransaction {
        validated: true,
        ..new_tx('B', 1, None)
    })?;
    ledger.create_transaction(new_tx('C', 2, None))?;

    let ids: Vec<String> = ledger
        .unvalidated_transactions()?
        .into_iter()
        .map(|tx| tx.id)
        .collect();
    assert_eq!(ids, vec![id('A'), id('C')]);
    Ok(())
}

pub fn nul_bytes_are_malformed<L: Ledger>(ledger: &L) -> Result<()> {
    let nul_url = NewValidator {
        url: Some("http://v.example.com/a\0b".to_string()),
        ..new_validator('V')
    };
    assert!(matches!(
        ledger.create_validator(nul_url),
        Err(LedgerError::MalformedInput { field: "url", .. })
    ));
    assert!(ledger.validators()?.is_empty());

    let cursor = Page::after(format!("{}\0", "A".repeat(42)), 10);
    assert!(matches!(
        ledger.transactions_by_epoch_after(Epoch(0), &cursor),
        Err(LedgerError::MalformedInput { field: "after", .. })
    ));
    Ok(())
}

/// Ids compare bytewise, whatever the database collation says.
pub fn ids_order_bytewise<L: Ledger>(ledger: &L) -> Result<()> {
    for c in ['a', 'B', '_', 'C'] {
        ledger.create_transaction(new_tx(c, 4, None))?;
        ledger.create_validator(NewValidator {
            address: id(c),
            url: None,
        })?;
        ledger.create_leader(&id(c))?;
    }
    let bytewise = vec![id('B'), id('C'), id('_'), id('a')];

    assert_eq!(tx_ids(ledger, 4)?, bytewise);

    let after_b: Vec<String> = ledger
        .transactions_by_epoch_after(Epoch(4), &Page::after(id('B'), 10))?
        .into_iter()
        .map(|tx| tx.id)
        .collect();
    assert_eq!(after_b, bytewise[1..].to_vec());

    let unvalidated: Vec<String> = ledger
        .unvalidated_transactions()?
        .into_iter()
        .map(|tx| tx.id)
        .collect();
    assert_eq!(unvalidated, bytewise);

    let validators: Vec<String> = ledger.validators()?.into_iter().map(|v| v.address).collect();
    assert_eq!(validators, bytewise);

    let leaders: Vec<String> = ledger.leaders()?.into_iter().map(|l| l.address).collect();
    assert_eq!(leaders, bytewise);
    Ok(())
}

pub fn counts_cover_every_table<L: Ledger>(ledger: &L) -> Result<()> {
    ledger.create_transaction(new_tx('A', 1, None))?;
    ledger.create_transaction(new_tx('B', 2, None))?;
    ledger.create_validator(new_validator('V'))?;
    ledger.create_validator(new_validator('W'))?;
    ledger.create_validator(new_validator('X'))?;
    ledger.create_leader(&id('W'))?;

    let counts = ledger.counts()?;
    assert_eq!(counts.transactions, 2);
    assert_eq!(counts.validators, 3);
    assert_eq!(counts.leaders, 1);
    Ok(())
}
