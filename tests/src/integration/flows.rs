//! # Integration Test Flows
//!
//! Drives a file-backed shop through `ShopApi` against the scripted ledger.
//!
//! ## Flows Tested
//!
//! 1. **Anonymous customer**: link request → register → sign challenges →
//!    checkout → partial and final payment → restart
//! 2. **Managed customer**: password link → checkout → pay from the wallet
//! 3. **Double spend**: one ledger transaction raced against one cart
//! 4. **Refusals**: forged signatures, fee transactions, unconfirmed ids

#[cfg(test)]
mod tests {
    use crate::integration::ledger::ScriptedLedger;
    use futures::future::join_all;
    use pos_01_checkout::{
        CartId, ItemId, JsonFileRecordStore, RegisteredWallet, ShopApi, ShopError,
        VerificationResponse, VerifiedAnonymousWallet, Wallet,
    };
    use pos_runtime::admin::add_catalog_item;
    use pos_runtime::{ShopConfig, ShopRuntime};
    use shared_crypto::{sha256, Ed25519KeyPair};
    use shared_types::{TransactionId, WalletId};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    type Shop = ShopRuntime<Arc<ScriptedLedger>>;

    fn shop_keys() -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed([1u8; 32])
    }

    fn config(dir: &Path) -> ShopConfig {
        ShopConfig {
            data_dir: dir.to_path_buf(),
            shop_name: "north".into(),
            receiving_address: Some(shop_keys().address().to_string()),
            fee_per_transaction: 1,
            ..ShopConfig::default()
        }
    }

    /// Seed a coffee (100) and a cake (50), then open the shop.
    fn open_seeded(dir: &Path, ledger: &Arc<ScriptedLedger>) -> Shop {
        let config = config(dir);
        let store = JsonFileRecordStore::new(config.shop_dir());
        add_catalog_item(&store, Some(ItemId::new("coffee")), "Coffee", 100).unwrap();
        add_catalog_item(&store, Some(ItemId::new("cake")), "Cake", 50).unwrap();
        ShopRuntime::open(&config, Arc::clone(ledger)).unwrap()
    }

    fn answer(registered: &RegisteredWallet, keys: &[&Ed25519KeyPair]) -> Vec<VerificationResponse> {
        registered
            .challenges
            .iter()
            .map(|challenge| {
                let key = keys
                    .iter()
                    .find(|key| key.address() == challenge.address)
                    .unwrap();
                VerificationResponse {
                    address: challenge.address.clone(),
                    signature: key.sign(&sha256(challenge.nonce.as_bytes())).to_hex(),
                }
            })
            .collect()
    }

    /// Run the whole link protocol for `keys` and return the verified wallet.
    async fn verify_customer(
        shop: &Shop,
        keys: &[&Ed25519KeyPair],
    ) -> Result<VerifiedAnonymousWallet, ShopError> {
        let service = shop.service();
        let request = service.request_link();
        let addresses: Vec<String> = keys.iter().map(|k| k.address().to_string()).collect();
        let registered = service.register_addresses(&addresses, &request.link_id)?;
        assert_eq!(registered.challenges.len(), keys.len());
        service
            .submit_verification(&registered.wallet_id, &answer(&registered, keys))
            .await
    }

    // =============================================================================
    // ANONYMOUS CUSTOMER
    // =============================================================================

    #[tokio::test]
    async fn test_anonymous_customer_pays_in_two_transfers() {
        let dir = tempdir().unwrap();
        let ledger = Arc::new(ScriptedLedger::new());
        let customer = Ed25519KeyPair::from_seed([2u8; 32]);
        let spare = Ed25519KeyPair::from_seed([3u8; 32]);
        ledger.fund(&customer.address(), 1_000);

        let shop = open_seeded(dir.path(), &ledger);
        let service = shop.service();
        let shop_address = service.shop_address();

        let wallet = verify_customer(&shop, &[&customer, &spare]).await.unwrap();
        assert_eq!(wallet.addresses().len(), 2);
        assert!(matches!(service.current_wallet().await, Some(Wallet::Anonymous(_))));

        service.add_item(&ItemId::new("coffee"), 2).await.unwrap();
        service.add_item(&ItemId::new("cake"), 2).await.unwrap();
        let cart = service.checkout(&customer.address()).await.unwrap();
        assert_eq!(cart.total_price, 300);
        assert!(!cart.confirmed);

        let first = ledger.transfer(&customer.address(), &shop_address, 200);
        let cart = service.reconcile(&first, &cart.id).await.unwrap();
        assert_eq!(cart.actual_receive, 200);
        assert!(!cart.confirmed);
        assert_eq!(service.current_lines().await.len(), 2);

        let second = ledger.transfer(&customer.address(), &shop_address, 100);
        let cart = service.reconcile(&second, &cart.id).await.unwrap();
        assert!(cart.confirmed);
        assert_eq!(cart.joined_transaction_ids, vec![first.clone(), second]);
        assert!(service.current_lines().await.is_empty());
        assert_eq!(ledger.balance(&shop_address), 300);

        assert_eq!(
            service.reconcile(&first, &cart.id).await,
            Err(ShopError::TransactionAlreadyUsed {
                transaction_id: first
            })
        );
    }

    #[tokio::test]
    async fn test_unsettled_cart_survives_restart() {
        let dir = tempdir().unwrap();
        let ledger = Arc::new(ScriptedLedger::new());
        let customer = Ed25519KeyPair::from_seed([4u8; 32]);
        ledger.fund(&customer.address(), 500);

        let (cart_id, wallet, first) = {
            let shop = open_seeded(dir.path(), &ledger);
            let service = shop.service();
            let wallet = verify_customer(&shop, &[&customer]).await.unwrap();
            service.add_item(&ItemId::new("coffee"), 1).await.unwrap();
            let cart = service.checkout(&customer.address()).await.unwrap();

            let first = ledger.transfer(&customer.address(), &service.shop_address(), 40);
            service.reconcile(&first, &cart.id).await.unwrap();
            (cart.id, wallet, first)
        };

        let config = config(dir.path());
        let shop = ShopRuntime::open(&config, Arc::clone(&ledger)).unwrap();
        let service = shop.service();
        assert_eq!(service.catalog().len(), 2);
        assert!(service.current_wallet().await.is_none());

        let pending = service
            .find_unsettled_cart_for(&Wallet::Anonymous(wallet))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pending.id, cart_id);
        assert_eq!(pending.outstanding(), 60);

        assert!(matches!(
            service.reconcile(&first, &cart_id).await,
            Err(ShopError::TransactionAlreadyUsed { .. })
        ));

        let rest = ledger.transfer(&customer.address(), &service.shop_address(), 60);
        assert!(service.reconcile(&rest, &cart_id).await.unwrap().confirmed);
    }

    #[tokio::test]
    async fn test_forged_signature_is_rejected() {
        let dir = tempdir().unwrap();
        let ledger = Arc::new(ScriptedLedger::new());
        let victim = Ed25519KeyPair::from_seed([5u8; 32]);
        let attacker = Ed25519KeyPair::from_seed([6u8; 32]);

        let shop = open_seeded(dir.path(), &ledger);
        let service = shop.service();
        let request = service.current_link_request();
        let registered = service
            .register_addresses(&[victim.address().to_string()], &request.link_id)
            .unwrap();

        let forged: Vec<VerificationResponse> = registered
            .challenges
            .iter()
            .map(|challenge| VerificationResponse {
                address: challenge.address.clone(),
                signature: attacker
                    .sign(&sha256(challenge.nonce.as_bytes()))
                    .to_hex(),
            })
            .collect();

        assert!(matches!(
            service
                .submit_verification(&registered.wallet_id, &forged)
                .await,
            Err(ShopError::InvalidSignature { .. })
        ));
        assert!(service.current_wallet().await.is_none());
        assert!(service.pending_wallet(&registered.wallet_id).is_some());
    }

    #[tokio::test]
    async fn test_stale_link_request_is_refused() {
        let dir = tempdir().unwrap();
        let ledger = Arc::new(ScriptedLedger::new());
        let customer = Ed25519KeyPair::from_seed([7u8; 32]);

        let shop = open_seeded(dir.path(), &ledger);
        let service = shop.service();
        let stale = service.request_link();
        let fresh = service.request_link();
        assert_ne!(stale.link_id, fresh.link_id);

        let addresses = [customer.address().to_string()];
        assert!(matches!(
            service.register_addresses(&addresses, &stale.link_id),
            Err(ShopError::InvalidLinkRequest { .. })
        ));
        assert!(service.register_addresses(&addresses, &fresh.link_id).is_ok());
    }

    // =============================================================================
    // MANAGED CUSTOMER
    // =============================================================================

    #[tokio::test]
    async fn test_managed_wallet_pays_from_ledger() {
        let dir = tempdir().unwrap();
        let ledger = Arc::new(ScriptedLedger::new());
        let customer = Ed25519KeyPair::from_seed([8u8; 32]);
        let wallet_id = WalletId::new("wallet-1");
        ledger.register_wallet(&wallet_id, "pw-hash", vec![customer.address()]);
        ledger.fund(&customer.address(), 400);

        let shop = open_seeded(dir.path(), &ledger);
        let service = shop.service();

        assert!(matches!(
            service.link_managed_wallet(&wallet_id, "wrong").await,
            Err(ShopError::InvalidPassword { .. })
        ));
        service.link_managed_wallet(&wallet_id, "pw-hash").await.unwrap();

        let info = service.wallet_address_info().await.unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].balance, 400);

        service.add_item(&ItemId::new("cake"), 3).await.unwrap();
        let cart = service.checkout(&customer.address()).await.unwrap();
        assert_eq!(cart.total_price, 150);

        let transaction = service.pay_with_managed_wallet(&cart.id).await.unwrap();
        assert_eq!(transaction.amount_to(&service.shop_address()), 150);
        assert_eq!(ledger.balance(&customer.address()), 250);

        let paid = service.cart(&cart.id).unwrap();
        assert!(paid.confirmed);
        assert_eq!(paid.joined_transaction_ids, vec![transaction.id]);
        assert!(service.current_lines().await.is_empty());

        assert!(matches!(
            service.pay_with_managed_wallet(&cart.id).await,
            Err(ShopError::CartAlreadyPaid { .. })
        ));
    }

    #[tokio::test]
    async fn test_checkout_requires_fee_headroom() {
        let dir = tempdir().unwrap();
        let ledger = Arc::new(ScriptedLedger::new());
        let customer = Ed25519KeyPair::from_seed([9u8; 32]);
        ledger.fund(&customer.address(), 100);

        let shop = open_seeded(dir.path(), &ledger);
        let service = shop.service();
        verify_customer(&shop, &[&customer]).await.unwrap();
        service.add_item(&ItemId::new("coffee"), 1).await.unwrap();

        assert_eq!(
            service.checkout(&customer.address()).await,
            Err(ShopError::InsufficientBalance {
                address: customer.address(),
                required: 101,
                available: 100,
            })
        );
        assert!(service.history().is_empty());
        assert!(service.current_payment_address().await.is_none());
    }

    // =============================================================================
    // RECONCILIATION RACES AND REFUSALS
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reconciles_credit_once() {
        let dir = tempdir().unwrap();
        let ledger = Arc::new(ScriptedLedger::new());
        let customer = Ed25519KeyPair::from_seed([10u8; 32]);
        ledger.fund(&customer.address(), 1_000);

        let shop = open_seeded(dir.path(), &ledger);
        let service = shop.service();
        verify_customer(&shop, &[&customer]).await.unwrap();
        service.add_item(&ItemId::new("coffee"), 5).await.unwrap();
        let cart = service.checkout(&customer.address()).await.unwrap();
        let transaction = ledger.transfer(&customer.address(), &service.shop_address(), 100);

        let attempts = (0..8).map(|_| {
            let service = shop.service();
            let transaction = transaction.clone();
            let cart_id = cart.id.clone();
            tokio::spawn(async move { service.reconcile(&transaction, &cart_id).await })
        });
        let results: Vec<_> = join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().all(|r| match r {
            Ok(_) => true,
            Err(e) => matches!(e, ShopError::TransactionAlreadyUsed { .. }),
        }));
        assert_eq!(service.cart(&cart.id).unwrap().actual_receive, 100);
    }

    #[tokio::test]
    async fn test_fee_and_unknown_transactions_are_not_confirmed() {
        let dir = tempdir().unwrap();
        let ledger = Arc::new(ScriptedLedger::new());
        let customer = Ed25519KeyPair::from_seed([11u8; 32]);
        ledger.fund(&customer.address(), 1_000);

        let shop = open_seeded(dir.path(), &ledger);
        let service = shop.service();
        verify_customer(&shop, &[&customer]).await.unwrap();
        service.add_item(&ItemId::new("cake"), 1).await.unwrap();
        let cart = service.checkout(&customer.address()).await.unwrap();

        let fee = ledger.mine_fee(&service.shop_address(), 50);
        assert!(matches!(
            service.reconcile(&fee, &cart.id).await,
            Err(ShopError::TransactionNotConfirmed { .. })
        ));
        assert!(matches!(
            service
                .reconcile(&TransactionId::new("never-mined"), &cart.id)
                .await,
            Err(ShopError::TransactionNotConfirmed { .. })
        ));
        assert!(matches!(
            service.reconcile(&fee, &CartId::new("missing")).await,
            Err(ShopError::CartNotFound { .. })
        ));
        assert_eq!(service.cart(&cart.id).unwrap().actual_receive, 0);
    }

    #[tokio::test]
    async fn test_second_process_cannot_open_same_shop() {
        let dir = tempdir().unwrap();
        let ledger = Arc::new(ScriptedLedger::new());
        let _shop = open_seeded(dir.path(), &ledger);

        let err = ShopRuntime::open(&config(dir.path()), Arc::clone(&ledger))
            .err()
            .unwrap();
        assert!(format!("{:#}", err).contains("already in use"));
    }
}
