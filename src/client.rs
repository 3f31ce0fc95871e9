use crate::api::DripApi;
use crate::config::DripConfig;
use crate::error::{DripError, Result};
use crate::types::*;
use crate::wallet::Wallet;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};
use spl_associated_token_account_client::{
    address::get_associated_token_address_with_program_id,
    instruction::create_associated_token_account_idempotent,
};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Legacy SPL token program
pub const TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// SPL Token-2022 program
pub const TOKEN_2022_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

/// Drip client: queries go to the Drip gateway, transactions are signed
/// locally and sent through Solana RPC.
#[derive(Clone)]
pub struct DripClient {
    config: DripConfig,
    http_client: Client,
    rpc: Arc<RpcClient>,
    wallet: Wallet,
}

impl DripClient {
    /// Create a new client. No connection is made until the first call.
    pub fn new(config: DripConfig, wallet: Wallet) -> Result<Self> {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.to_string(),
            config.timeout,
            config.commitment,
        );
        Self::with_rpc_client(config, wallet, rpc)
    }

    /// Create a client around an existing RPC client (e.g. `RpcClient::new_mock`)
    pub fn with_rpc_client(config: DripConfig, wallet: Wallet, rpc: RpcClient) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            config,
            http_client,
            rpc: Arc::new(rpc),
            wallet,
        })
    }

    /// Create a client for the devnet staging environment
    pub fn devnet_staging(wallet: Wallet) -> Result<Self> {
        Self::new(DripConfig::devnet_staging()?, wallet)
    }

    pub fn config(&self) -> &DripConfig {
        &self.config
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    // ===== Transactions =====

    /// Sign a gateway-built transaction, send it and wait for confirmation
    async fn submit(&self, encoded: &str) -> Result<Signature> {
        let mut transaction = decode_transaction(encoded)?;
        let signature = self.wallet.sign_transaction(&mut transaction)?;
        if !transaction.is_signed() {
            return Err(DripError::signing(
                "Transaction still requires signatures the wallet cannot provide",
            ));
        }

        // The gateway's blockhash is never newer than the latest one, so the
        // latest validity window bounds it.
        let (_, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.config.commitment)
            .await?;

        self.rpc.send_transaction(&transaction).await?;
        info!(%signature, "transaction submitted");
        self.wait_for_confirmation(&signature, last_valid_block_height)
            .await?;
        Ok(signature)
    }

    /// Poll until the signature reaches the configured commitment. Gives up
    /// once the chain passes `last_valid_block_height` without seeing it, or
    /// when `confirmation_timeout` elapses.
    async fn wait_for_confirmation(
        &self,
        signature: &Signature,
        last_valid_block_height: u64,
    ) -> Result<()> {
        let deadline = self.config.confirmation_timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(DripError::Timeout(format!(
                        "confirmation of {}",
                        signature
                    )));
                }
            }

            match self
                .rpc
                .get_signature_status_with_commitment(signature, self.config.commitment)
                .await?
            {
                Some(Ok(())) => {
                    info!(
                        %signature,
                        commitment = ?self.config.commitment.commitment,
                        "transaction confirmed"
                    );
                    return Ok(());
                }
                Some(Err(err)) => {
                    error!(%signature, %err, "transaction failed");
                    return Err(DripError::Transaction {
                        signature: signature.to_string(),
                        message: err.to_string(),
                    });
                }
                None => {
                    let block_height = self.rpc.get_block_height().await?;
                    if block_height > last_valid_block_height {
                        warn!(
                            %signature,
                            block_height,
                            last_valid_block_height,
                            "blockhash expired"
                        );
                        return Err(DripError::Timeout(format!(
                            "confirmation of {}: not seen before block height {}",
                            signature, last_valid_block_height
                        )));
                    }
                    debug!(%signature, block_height, "transaction pending");
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Token program that owns `mint`
    async fn mint_token_program(&self, mint: &Pubkey) -> Result<Pubkey> {
        let account = self.rpc.get_account(mint).await?;
        token_program_for(mint, &account.owner)
    }

    async fn position_transaction(&self, position: &Pubkey, action: &str) -> Result<TxResult> {
        let body = PositionTxRequest {
            owner: self.wallet.pubkey(),
        };
        let unsigned: UnsignedTransaction = self
            .request(
                &format!("drip/positions/{}/{}", position, action),
                &RequestConfig::post(&body)?,
            )
            .await?;
        let signature = self.submit(&unsigned.transaction).await?;
        Ok(TxResult {
            id: signature.to_string(),
        })
    }

    // ===== Private Helper Methods =====

    /// GET with retries; 404 maps to `None`
    async fn query<T>(&self, path: &str, config: RequestConfig) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let config = &config;
        with_retry(self.config.max_retries, self.config.retry_delay, move || {
            self.request_optional(path, config)
        })
        .await
    }

    async fn request<T>(&self, path: &str, config: &RequestConfig) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request_optional(path, config)
            .await?
            .ok_or_else(|| DripError::api(404, format!("{} not found", path)))
    }

    /// Make an HTTP request to the gateway
    async fn request_optional<T>(&self, path: &str, config: &RequestConfig) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.config.api_url(path);
        debug!(method = %config.method, %url, "gateway request");
        let mut request = self.http_client.request(config.method.clone(), &url);

        if let Some(query) = &config.query {
            request = request.query(query);
        }

        if let Some(body) = &config.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Handle HTTP response and convert to the desired type
    async fn handle_response<T>(&self, response: Response) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if status.is_success() {
            let text = response.text().await?;
            debug!("Gateway response: {}", text);
            serde_json::from_str(&text).map(Some).map_err(DripError::Json)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Gateway error {}: {}", status, error_text);
            Err(DripError::api(status.as_u16(), error_text))
        }
    }
}

impl DripApi for DripClient {
    fn program_id(&self) -> Pubkey {
        self.config.program_id
    }

    fn owner(&self) -> Pubkey {
        self.wallet.pubkey()
    }

    async fn get_all_token_bs(&self, token_a: &Pubkey) -> Result<TokenBs> {
        let path = format!("drip/{}/tokenBs", token_a);
        Ok(self
            .query(&path, RequestConfig::get())
            .await?
            .unwrap_or_default())
    }

    async fn get_supported_vault_proto_configs_for_pair(
        &self,
        token_a: &Pubkey,
        token_b: &Pubkey,
    ) -> Result<Vec<VaultProtoConfig>> {
        let query = ProtoConfigQuery {
            token_a: *token_a,
            token_b: *token_b,
        };
        let config = RequestConfig::get().with_query(query.to_query_params());
        Ok(self
            .query("drip/vaultProtoConfigs", config)
            .await?
            .unwrap_or_default())
    }

    async fn fetch_vault_account(&self, vault: &Pubkey) -> Result<Option<VaultAccount>> {
        self.query(&format!("drip/vaults/{}", vault), RequestConfig::get())
            .await
    }

    async fn fetch_position_account(&self, position: &Pubkey) -> Result<Option<PositionAccount>> {
        self.query(&format!("drip/positions/{}", position), RequestConfig::get())
            .await
    }

    async fn deposit(
        &self,
        vault: &Pubkey,
        params: &DepositParams,
        with_metadata: bool,
    ) -> Result<DepositResult> {
        params.validate()?;
        let body = DepositRequest::new(*vault, self.wallet.pubkey(), params, with_metadata);
        let built: DepositTransaction = self
            .request("drip/deposit", &RequestConfig::post(&body)?)
            .await?;

        if with_metadata && built.position_metadata_account.is_none() {
            return Err(DripError::decode(
                "Gateway did not return a position metadata account",
            ));
        }

        let signature = self.submit(&built.transaction).await?;
        info!(%vault, position = %built.position, amount = params.amount, "deposit confirmed");

        Ok(DepositResult {
            id: signature.to_string(),
            position: built.position,
            position_metadata_account: if with_metadata {
                built.position_metadata_account
            } else {
                None
            },
        })
    }

    async fn create_token_account(&self, mint: &Pubkey, owner: &Pubkey) -> Result<Pubkey> {
        let payer = self.wallet.pubkey();
        let token_program = self.mint_token_program(mint).await?;
        let account = get_associated_token_address_with_program_id(owner, mint, &token_program);
        let instruction =
            create_associated_token_account_idempotent(&payer, owner, mint, &token_program);

        let (blockhash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.config.commitment)
            .await?;
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&payer),
            &[self.wallet.keypair()],
            blockhash,
        );
        let signature = self.rpc.send_transaction(&transaction).await?;
        self.wait_for_confirmation(&signature, last_valid_block_height)
            .await?;
        info!(%account, %owner, %mint, "token account ready");

        Ok(account)
    }

    async fn withdraw_b(&self, position: &Pubkey) -> Result<TxResult> {
        self.position_transaction(position, "withdrawB").await
    }

    async fn close_position(&self, position: &Pubkey) -> Result<TxResult> {
        self.position_transaction(position, "close").await
    }
}

impl fmt::Debug for DripClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DripClient")
            .field("config", &self.config)
            .field("wallet", &self.wallet)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct RequestConfig {
    method: Method,
    query: Option<HashMap<String, String>>,
    body: Option<serde_json::Value>,
}

impl RequestConfig {
    fn get() -> Self {
        Self {
            method: Method::GET,
            query: None,
            body: None,
        }
    }

    fn post<T: Serialize>(body: &T) -> Result<Self> {
        Ok(Self {
            method: Method::POST,
            query: None,
            body: Some(serde_json::to_value(body)?),
        })
    }

    fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = Some(query);
        self
    }
}

/// Check that a mint account owner is one of the SPL token programs
pub fn token_program_for(mint: &Pubkey, owner: &Pubkey) -> Result<Pubkey> {
    if *owner == TOKEN_PROGRAM_ID || *owner == TOKEN_2022_PROGRAM_ID {
        Ok(*owner)
    } else {
        Err(DripError::validation(format!(
            "Mint {} is owned by {}, not a token program",
            mint, owner
        )))
    }
}

/// Decode a base64, bincode-serialized transaction
pub fn decode_transaction(encoded: &str) -> Result<Transaction> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| DripError::decode(format!("Transaction is not valid base64: {}", e)))?;
    bincode::deserialize(&bytes)
        .map_err(|e| DripError::decode(format!("Transaction does not deserialize: {}", e)))
}

/// Run `op` until it succeeds, fails permanently or `max_retries` retries
/// are spent. The delay doubles after every attempt.
pub(crate) async fn with_retry<T, F, Fut>(max_retries: u32, delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    let mut delay = delay;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_retries => {
                attempt += 1;
                warn!(attempt, max_retries, %err, "retrying gateway query");
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Builder for creating configured Drip clients
#[derive(Debug, Default)]
pub struct DripClientBuilder {
    config: Option<DripConfig>,
    wallet: Option<Wallet>,
}

impl DripClientBuilder {
    /// Create a new client builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn config(mut self, config: DripConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn wallet(mut self, wallet: Wallet) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Load the wallet from the environment variable named in the config
    /// (`EXAMPLE_WALLET` unless overridden)
    pub fn wallet_from_env(mut self) -> Result<Self> {
        let var = match &self.config {
            Some(config) => config.wallet_env.clone(),
            None => crate::config::DEFAULT_WALLET_ENV.to_string(),
        };
        self.wallet = Some(Wallet::from_env(&var)?);
        Ok(self)
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Result<Self> {
        let config = match self.config.take() {
            Some(config) => config,
            None => DripConfig::devnet_staging()?,
        };
        self.config = Some(config.with_timeout(timeout));
        Ok(self)
    }

    /// Build the client
    pub fn build(self) -> Result<DripClient> {
        let wallet = self
            .wallet
            .ok_or_else(|| DripError::config("A wallet is required to build a client"))?;
        let config = match self.config {
            Some(config) => config,
            None => DripConfig::devnet_staging()?,
        };
        DripClient::new(config, wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use solana_client::rpc_request::RpcRequest;
    use solana_sdk::{hash::Hash, message::Message, signer::Signer};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn client_with_rpc(rpc: RpcClient) -> DripClient {
        DripClient::with_rpc_client(DripConfig::local().unwrap(), Wallet::generate(), rpc).unwrap()
    }

    #[tokio::test]
    async fn test_client_creation() {
        let wallet = Wallet::generate();
        let pubkey = wallet.pubkey();
        let client = DripClient::devnet_staging(wallet).unwrap();

        assert_eq!(client.owner(), pubkey);
        assert_eq!(client.program_id(), client.config().program_id);
    }

    #[tokio::test]
    async fn test_client_builder() {
        let client = DripClientBuilder::new()
            .config(DripConfig::local().unwrap())
            .wallet(Wallet::generate())
            .timeout(Duration::from_secs(10))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(client.config().timeout, Duration::from_secs(10));
        assert_eq!(client.config().rpc_url.as_str(), "http://127.0.0.1:8899/");
    }

    #[test]
    fn test_builder_requires_wallet() {
        let err = DripClientBuilder::new().build().unwrap_err();
        assert!(matches!(err, DripError::Config(_)));
    }

    #[test]
    fn test_decode_transaction() {
        let payer = Wallet::generate();
        let message = Message::new_with_blockhash(&[], Some(&payer.pubkey()), &Hash::new_unique());
        let transaction = Transaction::new_unsigned(message);
        let encoded = BASE64.encode(bincode::serialize(&transaction).unwrap());

        let decoded = decode_transaction(&encoded).unwrap();
        assert_eq!(decoded.message.account_keys[0], payer.keypair().pubkey());

        assert!(matches!(
            decode_transaction("%%%").unwrap_err(),
            DripError::Decode(_)
        ));
        assert!(matches!(
            decode_transaction(&BASE64.encode([1u8, 2, 3])).unwrap_err(),
            DripError::Decode(_)
        ));
    }

    #[tokio::test]
    async fn test_retry_stops_after_max_retries() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<()> = with_retry(2, Duration::ZERO, move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(DripError::api(503, "unavailable".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_does_not_repeat_permanent_errors() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<()> = with_retry(5, Duration::ZERO, move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(DripError::api(400, "bad request".to_string()))
        })
        .await;

        assert!(matches!(result, Err(DripError::Api { status: 400, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let value = with_retry(3, Duration::ZERO, move || async move {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DripError::api(502, "bad gateway".to_string()))
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_confirmation_gives_up_after_blockhash_expiry() {
        let mut mocks = HashMap::new();
        mocks.insert(RpcRequest::GetBlockHeight, json!(101));
        let client = client_with_rpc(RpcClient::new_mock_with_mocks(
            "sig_not_found".to_string(),
            mocks,
        ));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.wait_for_confirmation(&Signature::default(), 100),
        )
        .await
        .expect("confirmation polling must end once the blockhash expires");

        let err = result.unwrap_err();
        assert!(matches!(err, DripError::Timeout(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::Remote);
    }

    #[tokio::test]
    async fn test_confirmation_succeeds() {
        let client = client_with_rpc(RpcClient::new_mock("succeeds".to_string()));
        assert!(client
            .wait_for_confirmation(&Signature::default(), 100)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_confirmation_reports_failed_transaction() {
        let client = client_with_rpc(RpcClient::new_mock("instruction_error".to_string()));
        let err = client
            .wait_for_confirmation(&Signature::default(), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, DripError::Transaction { .. }));
    }

    #[test]
    fn test_token_program_for_mint_owner() {
        let mint = Pubkey::new_unique();
        assert_eq!(
            token_program_for(&mint, &TOKEN_PROGRAM_ID).unwrap(),
            TOKEN_PROGRAM_ID
        );
        assert_eq!(
            token_program_for(&mint, &TOKEN_2022_PROGRAM_ID).unwrap(),
            TOKEN_2022_PROGRAM_ID
        );
        assert!(matches!(
            token_program_for(&mint, &Pubkey::new_unique()),
            Err(DripError::Validation(_))
        ));
    }

    #[test]
    fn test_token_2022_account_differs_from_legacy() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert_ne!(
            get_associated_token_address_with_program_id(&owner, &mint, &TOKEN_PROGRAM_ID),
            get_associated_token_address_with_program_id(&owner, &mint, &TOKEN_2022_PROGRAM_ID)
        );
    }
}
