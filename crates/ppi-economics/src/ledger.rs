// crates/ppi-economics/src/ledger.rs
//
// In-memory multi-token ledger with ERC20-style semantics.
//
// Stands in for the fungible-asset contracts the farm talks to: every token
// is identified by its contract address, and each operation either completes
// or fails without touching any balance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ppi_core::{Address, Amount, PpiError};

/// Balances and allowances for every token the protocol touches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    /// token -> holder -> balance
    balances: BTreeMap<Address, BTreeMap<Address, Amount>>,
    /// token -> owner -> spender -> allowance
    allowances: BTreeMap<Address, BTreeMap<Address, BTreeMap<Address, Amount>>>,
    /// token -> total minted
    supplies: BTreeMap<Address, Amount>,
}

impl TokenLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `holder` in `token`.
    pub fn balance_of(&self, token: &Address, holder: &Address) -> Amount {
        self.balances
            .get(token)
            .and_then(|holders| holders.get(holder))
            .copied()
            .unwrap_or(0)
    }

    /// Total units of `token` ever minted.
    pub fn total_supply(&self, token: &Address) -> Amount {
        self.supplies.get(token).copied().unwrap_or(0)
    }

    /// Remaining allowance of `spender` over `owner`'s `token`.
    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(token)
            .and_then(|owners| owners.get(owner))
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Create `amount` new units of `token` for `to`.
    ///
    /// Saturates instead of failing; only the reward token is ever minted and
    /// its total is bounded by the emission schedule.
    pub fn mint(&mut self, token: &Address, to: &Address, amount: Amount) {
        if amount == 0 {
            return;
        }
        let supply = self.supplies.entry(*token).or_insert(0);
        *supply = supply.saturating_add(amount);
        let balance = self
            .balances
            .entry(*token)
            .or_default()
            .entry(*to)
            .or_insert(0);
        *balance = balance.saturating_add(amount);
        tracing::debug!("Minted {} units of {} to {}", amount, token, to);
    }

    /// Set `spender`'s allowance over `owner`'s `token` to `amount`.
    pub fn approve(&mut self, token: &Address, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances
            .entry(*token)
            .or_default()
            .entry(*owner)
            .or_default()
            .insert(*spender, amount);
    }

    /// Check that `from` can send `amount` of `token` without moving anything.
    pub fn ensure_balance(
        &self,
        token: &Address,
        from: &Address,
        amount: Amount,
    ) -> Result<(), PpiError> {
        let available = self.balance_of(token, from);
        if amount > available {
            return Err(PpiError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    /// Check that `spender` may pull `amount` of `from`'s `token`.
    pub fn ensure_transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        amount: Amount,
    ) -> Result<(), PpiError> {
        let allowed = self.allowance(token, from, spender);
        if amount > allowed {
            return Err(PpiError::InsufficientAllowance {
                requested: amount,
                allowed,
            });
        }
        self.ensure_balance(token, from, amount)
    }

    /// Move `amount` of `token` from `from` to `to`.
    ///
    /// # Errors
    /// `InsufficientBalance` if `from` holds less than `amount`; nothing moves.
    pub fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), PpiError> {
        self.ensure_balance(token, from, amount)?;
        if amount == 0 || from == to {
            return Ok(());
        }
        let holders = self.balances.entry(*token).or_default();
        if let Some(balance) = holders.get_mut(from) {
            *balance -= amount;
        }
        let balance = holders.entry(*to).or_insert(0);
        *balance = balance.saturating_add(amount);
        Ok(())
    }

    /// Move `amount` of `from`'s `token` to `to` on behalf of `spender`,
    /// consuming allowance.
    ///
    /// # Errors
    /// `InsufficientAllowance` or `InsufficientBalance`; nothing moves.
    pub fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), PpiError> {
        self.ensure_transfer_from(token, spender, from, amount)?;
        let allowed = self.allowance(token, from, spender);
        // An unlimited approval is never consumed.
        if allowed != Amount::MAX {
            self.approve(token, from, spender, allowed - amount);
        }
        self.transfer(token, from, to, amount)
    }
}
