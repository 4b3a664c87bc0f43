//! Scripted ledger collaborator.
//!
//! Holds balances and "mined" transactions in memory. Transactions handed to
//! `submit_transaction` are included immediately and move balances.

use async_trait::async_trait;
use parking_lot::Mutex;
use pos_01_checkout::LedgerGateway;
use shared_types::{
    Address, Amount, LedgerError, LedgerTransaction, TransactionId, TransactionInput,
    TransactionOutput, TransactionType, WalletId,
};
use std::collections::HashMap;

struct ManagedWallet {
    password_hash: String,
    addresses: Vec<Address>,
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<Address, Amount>,
    blocks: HashMap<TransactionId, LedgerTransaction>,
    wallets: HashMap<WalletId, ManagedWallet>,
    next_id: u64,
}

#[derive(Default)]
pub struct ScriptedLedger {
    state: Mutex<LedgerState>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund(&self, address: &Address, amount: Amount) {
        *self.state.lock().balances.entry(address.clone()).or_default() += amount;
    }

    pub fn register_wallet(&self, wallet_id: &WalletId, password_hash: &str, addresses: Vec<Address>) {
        self.state.lock().wallets.insert(
            wallet_id.clone(),
            ManagedWallet {
                password_hash: password_hash.to_string(),
                addresses,
            },
        );
    }

    /// Transfer `amount` from `from` to `to` outside the shop and mine it.
    pub fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> TransactionId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = TransactionId::new(format!("ledger-tx-{}", state.next_id));
        let transaction = LedgerTransaction {
            id: id.clone(),
            tx_type: TransactionType::Regular,
            inputs: Vec::new(),
            outputs: vec![TransactionOutput {
                address: to.clone(),
                amount,
            }],
        };
        Self::apply(&mut state, from, &transaction);
        id
    }

    /// Mine a fee transaction paying `to`.
    pub fn mine_fee(&self, to: &Address, amount: Amount) -> TransactionId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = TransactionId::new(format!("fee-tx-{}", state.next_id));
        state.blocks.insert(
            id.clone(),
            LedgerTransaction {
                id: id.clone(),
                tx_type: TransactionType::Fee,
                inputs: Vec::new(),
                outputs: vec![TransactionOutput {
                    address: to.clone(),
                    amount,
                }],
            },
        );
        id
    }

    pub fn balance(&self, address: &Address) -> Amount {
        self.state.lock().balances.get(address).copied().unwrap_or(0)
    }

    fn apply(state: &mut LedgerState, from: &Address, transaction: &LedgerTransaction) {
        let spent: Amount = transaction.outputs.iter().map(|o| o.amount).sum();
        let balance = state.balances.entry(from.clone()).or_default();
        *balance = balance.saturating_sub(spent);
        for output in &transaction.outputs {
            *state.balances.entry(output.address.clone()).or_default() += output.amount;
        }
        state
            .blocks
            .insert(transaction.id.clone(), transaction.clone());
    }
}

#[async_trait]
impl LedgerGateway for ScriptedLedger {
    async fn transaction_in_block(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<LedgerTransaction>, LedgerError> {
        Ok(self.state.lock().blocks.get(transaction_id).cloned())
    }

    async fn address_balance(&self, address: &Address) -> Result<Amount, LedgerError> {
        self.state
            .lock()
            .balances
            .get(address)
            .copied()
            .ok_or_else(|| LedgerError::AddressHasNoHistory {
                address: address.clone(),
            })
    }

    async fn wallet_addresses(&self, wallet_id: &WalletId) -> Result<Vec<Address>, LedgerError> {
        self.state
            .lock()
            .wallets
            .get(wallet_id)
            .map(|wallet| wallet.addresses.clone())
            .ok_or_else(|| LedgerError::WalletNotFound {
                wallet_id: wallet_id.clone(),
            })
    }

    async fn create_transaction(
        &self,
        wallet_id: &WalletId,
        from: &Address,
        to: &Address,
        amount: Amount,
        change_address: &Address,
    ) -> Result<LedgerTransaction, LedgerError> {
        let mut state = self.state.lock();
        let owns = state
            .wallets
            .get(wallet_id)
            .map(|wallet| wallet.addresses.contains(from))
            .ok_or_else(|| LedgerError::WalletNotFound {
                wallet_id: wallet_id.clone(),
            })?;
        if !owns {
            return Err(LedgerError::Rejected {
                reason: format!("{} is not an address of wallet {}", from, wallet_id),
            });
        }

        let available = state.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerError::Rejected {
                reason: format!("balance {} below {}", available, amount),
            });
        }

        state.next_id += 1;
        let id = TransactionId::new(format!("wallet-tx-{}", state.next_id));
        let mut outputs = vec![TransactionOutput {
            address: to.clone(),
            amount,
        }];
        if available > amount {
            outputs.push(TransactionOutput {
                address: change_address.clone(),
                amount: available - amount,
            });
        }
        Ok(LedgerTransaction {
            id: id.clone(),
            tx_type: TransactionType::Regular,
            inputs: vec![TransactionInput {
                transaction: TransactionId::new("genesis"),
                index: 0,
                amount: available,
                address: from.clone(),
                signature: Some("signed".into()),
            }],
            outputs,
        })
    }

    async fn submit_transaction(
        &self,
        transaction: LedgerTransaction,
    ) -> Result<LedgerTransaction, LedgerError> {
        let mut state = self.state.lock();
        if state.blocks.contains_key(&transaction.id) {
            return Err(LedgerError::Rejected {
                reason: format!("transaction {} already exists", transaction.id),
            });
        }
        let from = transaction
            .inputs
            .first()
            .map(|input| input.address.clone())
            .ok_or_else(|| LedgerError::Rejected {
                reason: "transaction has no inputs".into(),
            })?;
        Self::apply(&mut state, &from, &transaction);
        Ok(transaction)
    }

    async fn check_wallet_password(
        &self,
        wallet_id: &WalletId,
        password_hash: &str,
    ) -> Result<bool, LedgerError> {
        self.state
            .lock()
            .wallets
            .get(wallet_id)
            .map(|wallet| wallet.password_hash == password_hash)
            .ok_or_else(|| LedgerError::WalletNotFound {
                wallet_id: wallet_id.clone(),
            })
    }
}
