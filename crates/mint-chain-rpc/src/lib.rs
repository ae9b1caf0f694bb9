pub mod abi;

use async_trait::async_trait;
use futures_util::stream;
use mint_api_types::{
    Address, ChainId, MintEvent, TxHash, TxReceipt, TxStatus, parse_quantity,
};
use mint_chain_client::{
    MintContract, MintEventSubscription, ProviderError, ProviderResult, Subscription,
    WalletProvider,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::abi::{MINT_EVENT_TOPIC, MINT_SELECTOR, RawLog, TOTAL_MINTED_SELECTOR};

/// An EIP-1193 `request({ method, params })` endpoint.
///
/// In the browser this is `window.ethereum`; tests script it.
#[async_trait(?Send)]
pub trait Eip1193Transport {
    fn is_available(&self) -> bool;
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value>;
    /// Wait between polls of receipts and logs.
    async fn pause(&self, interval: Duration);
}

pub struct RpcWalletProvider<T> {
    transport: T,
}

impl<T: Eip1193Transport> RpcWalletProvider<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn accounts(&self, method: &str) -> ProviderResult<Vec<Address>> {
        if !self.transport.is_available() {
            return Err(ProviderError::MissingProvider);
        }
        let value = self.transport.request(method, json!([])).await?;
        let raw: Vec<String> = serde_json::from_value(value)
            .map_err(|err| ProviderError::Decode(format!("{method}: {err}")))?;
        raw.iter()
            .map(|account| Address::parse(account).map_err(ProviderError::from))
            .collect()
    }
}

#[async_trait(?Send)]
impl<T: Eip1193Transport> WalletProvider for RpcWalletProvider<T> {
    fn is_available(&self) -> bool {
        self.transport.is_available()
    }

    async fn authorized_accounts(&self) -> ProviderResult<Vec<Address>> {
        self.accounts("eth_accounts").await
    }

    async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
        self.accounts("eth_requestAccounts").await
    }

    async fn chain_id(&self) -> ProviderResult<ChainId> {
        if !self.transport.is_available() {
            return Err(ProviderError::MissingProvider);
        }
        let value = self.transport.request("eth_chainId", json!([])).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| ProviderError::Decode(format!("eth_chainId: {value}")))?;
        Ok(ChainId::from_hex(raw)?)
    }
}

/// Contract adapter speaking raw JSON-RPC through the wallet provider.
pub struct RpcMintContract<T> {
    transport: T,
    address: Address,
    confirmation_poll: Duration,
    event_poll: Duration,
}

impl<T> RpcMintContract<T>
where
    T: Eip1193Transport + Clone + 'static,
{
    pub fn new(
        transport: T,
        address: Address,
        confirmation_poll: Duration,
        event_poll: Duration,
    ) -> Self {
        Self {
            transport,
            address,
            confirmation_poll,
            event_poll,
        }
    }

    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        if !self.transport.is_available() {
            return Err(ProviderError::MissingProvider);
        }
        self.transport.request(method, params).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
}

fn parse_receipt(value: Value) -> ProviderResult<TxReceipt> {
    let raw: RawReceipt = serde_json::from_value(value)
        .map_err(|err| ProviderError::Decode(format!("receipt: {err}")))?;
    let block_number = match raw.block_number.as_deref() {
        Some(block) => parse_quantity(block)?,
        None => 0,
    };
    let status = match raw.status.as_deref().map(parse_quantity).transpose()? {
        Some(0) => TxStatus::Reverted,
        _ => TxStatus::Confirmed,
    };
    Ok(TxReceipt {
        tx_hash: TxHash::parse(&raw.transaction_hash)?,
        block_number,
        status,
    })
}

async fn block_number<T: Eip1193Transport>(transport: &T) -> ProviderResult<u64> {
    let value = transport.request("eth_blockNumber", json!([])).await?;
    let raw = value
        .as_str()
        .ok_or_else(|| ProviderError::Decode(format!("eth_blockNumber: {value}")))?;
    Ok(parse_quantity(raw)?)
}

async fn mint_logs<T: Eip1193Transport>(
    transport: &T,
    address: &Address,
    from_block: u64,
    to_block: u64,
) -> ProviderResult<Vec<MintEvent>> {
    let filter = json!([{
        "address": address.as_str(),
        "fromBlock": format!("0x{from_block:x}"),
        "toBlock": format!("0x{to_block:x}"),
        "topics": [MINT_EVENT_TOPIC],
    }]);
    let value = transport.request("eth_getLogs", filter).await?;
    let logs: Vec<RawLog> = serde_json::from_value(value)
        .map_err(|err| ProviderError::Decode(format!("eth_getLogs: {err}")))?;

    let mut events = Vec::with_capacity(logs.len());
    for log in logs.iter().filter(|log| !log.removed) {
        match abi::decode_mint_event(log) {
            Ok(event) => events.push(event),
            Err(err) => warn!("skipping undecodable mint log: {err}"),
        }
    }
    Ok(events)
}

struct LogCursor<T> {
    transport: T,
    address: Address,
    next_block: u64,
    interval: Duration,
    queued: VecDeque<MintEvent>,
    cancelled: Rc<Cell<bool>>,
}

impl<T: Eip1193Transport> LogCursor<T> {
    /// Poll until a mint event is available or the subscription is cancelled.
    async fn next_event(&mut self) -> Option<MintEvent> {
        loop {
            if self.cancelled.get() {
                return None;
            }
            if let Some(event) = self.queued.pop_front() {
                return Some(event);
            }

            self.transport.pause(self.interval).await;
            if self.cancelled.get() {
                return None;
            }

            let head = match block_number(&self.transport).await {
                Ok(head) => head,
                Err(err) => {
                    warn!("mint event poll failed: {err}");
                    continue;
                }
            };
            if head < self.next_block {
                continue;
            }

            match mint_logs(&self.transport, &self.address, self.next_block, head).await {
                Ok(events) => {
                    debug!(
                        from = self.next_block,
                        to = head,
                        count = events.len(),
                        "polled mint events"
                    );
                    self.queued.extend(events);
                    self.next_block = head + 1;
                }
                Err(err) => warn!("mint event poll failed: {err}"),
            }
        }
    }
}

#[async_trait(?Send)]
impl<T> MintContract for RpcMintContract<T>
where
    T: Eip1193Transport + Clone + 'static,
{
    fn address(&self) -> &Address {
        &self.address
    }

    async fn total_minted(&self) -> ProviderResult<u64> {
        let params = json!([
            { "to": self.address.as_str(), "data": abi::call_data(TOTAL_MINTED_SELECTOR) },
            "latest",
        ]);
        let value = self.request("eth_call", params).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| ProviderError::Decode(format!("eth_call: {value}")))?;
        abi::decode_u64_word(raw)
    }

    async fn submit_mint(&self, from: &Address) -> ProviderResult<TxHash> {
        let params = json!([{
            "from": from.as_str(),
            "to": self.address.as_str(),
            "data": abi::call_data(MINT_SELECTOR),
        }]);
        let value = self.request("eth_sendTransaction", params).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| ProviderError::Decode(format!("eth_sendTransaction: {value}")))?;
        Ok(TxHash::parse(raw)?)
    }

    async fn wait_for_confirmation(&self, tx_hash: &TxHash) -> ProviderResult<TxReceipt> {
        loop {
            let value = self
                .request("eth_getTransactionReceipt", json!([tx_hash.as_str()]))
                .await?;
            if !value.is_null() {
                return parse_receipt(value);
            }
            self.transport.pause(self.confirmation_poll).await;
        }
    }

    async fn subscribe_mint_events(&self) -> ProviderResult<MintEventSubscription> {
        if !self.transport.is_available() {
            return Err(ProviderError::MissingProvider);
        }
        let head = block_number(&self.transport).await?;
        let cancelled = Rc::new(Cell::new(false));

        let cursor = LogCursor {
            transport: self.transport.clone(),
            address: self.address.clone(),
            next_block: head + 1,
            interval: self.event_poll,
            queued: VecDeque::new(),
            cancelled: cancelled.clone(),
        };
        let events = stream::unfold(cursor, |mut cursor| async move {
            cursor.next_event().await.map(|event| (event, cursor))
        });

        Ok(MintEventSubscription {
            events: Box::pin(events),
            handle: Subscription::new(move || cancelled.set(true)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use mint_api_types::TokenId;
    use std::cell::RefCell;

    const CONTRACT: &str = "0x5310b3dec733e56c64dc5319efe5df752d25bcab";
    const ACCOUNT: &str = "0xab00000000000000000000000000000000000001";

    #[derive(Default)]
    struct Script {
        replies: VecDeque<(String, ProviderResult<Value>)>,
        calls: Vec<(String, Value)>,
        pauses: usize,
    }

    #[derive(Clone, Default)]
    struct ScriptedTransport {
        absent: bool,
        script: Rc<RefCell<Script>>,
    }

    impl ScriptedTransport {
        fn reply(&self, method: &str, result: ProviderResult<Value>) -> &Self {
            self.script
                .borrow_mut()
                .replies
                .push_back((method.to_owned(), result));
            self
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.script.borrow().calls.clone()
        }
    }

    #[async_trait(?Send)]
    impl Eip1193Transport for ScriptedTransport {
        fn is_available(&self) -> bool {
            !self.absent
        }

        async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
            let mut script = self.script.borrow_mut();
            script.calls.push((method.to_owned(), params));
            let (expected, result) = script
                .replies
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected call to {method}"));
            assert_eq!(expected, method);
            result
        }

        async fn pause(&self, _interval: Duration) {
            self.script.borrow_mut().pauses += 1;
        }
    }

    fn contract(transport: &ScriptedTransport) -> RpcMintContract<ScriptedTransport> {
        RpcMintContract::new(
            transport.clone(),
            Address::parse(CONTRACT).unwrap(),
            Duration::from_millis(10),
            Duration::from_millis(10),
        )
    }

    fn mint_log(token: u64) -> Value {
        json!({
            "address": CONTRACT,
            "topics": [MINT_EVENT_TOPIC],
            "data": format!("0x{:0>64}{token:064x}", &ACCOUNT[2..]),
            "removed": false,
        })
    }

    #[tokio::test]
    async fn missing_provider_short_circuits() -> anyhow::Result<()> {
        let transport = ScriptedTransport {
            absent: true,
            ..Default::default()
        };
        let provider = RpcWalletProvider::new(transport.clone());
        assert_eq!(
            provider.request_accounts().await,
            Err(ProviderError::MissingProvider)
        );
        assert_eq!(
            contract(&transport).total_minted().await,
            Err(ProviderError::MissingProvider)
        );
        assert!(transport.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn accounts_and_chain_id_are_validated() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport
            .reply("eth_accounts", Ok(json!([ACCOUNT.to_uppercase().replacen("0X", "0x", 1)])))
            .reply("eth_chainId", Ok(json!("0x4")))
            .reply("eth_requestAccounts", Ok(json!(["not-an-address"])));
        let provider = RpcWalletProvider::new(transport.clone());

        let accounts = provider.authorized_accounts().await?;
        assert_eq!(accounts, vec![Address::parse(ACCOUNT)?]);
        assert_eq!(provider.chain_id().await?, ChainId(4));
        assert!(matches!(
            provider.request_accounts().await,
            Err(ProviderError::Decode(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn user_rejection_passes_through() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport.reply("eth_requestAccounts", Err(ProviderError::from_rpc(4001, "denied")));
        let provider = RpcWalletProvider::new(transport);
        assert_eq!(
            provider.request_accounts().await,
            Err(ProviderError::UserRejected)
        );
        Ok(())
    }

    #[tokio::test]
    async fn total_minted_issues_eth_call() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport.reply("eth_call", Ok(json!(format!("0x{:064x}", 12))));

        assert_eq!(contract(&transport).total_minted().await?, 12);

        let calls = transport.calls();
        assert_eq!(calls[0].1[0]["to"], json!(CONTRACT));
        assert_eq!(calls[0].1[0]["data"], json!("0xb4c3b8be"));
        assert_eq!(calls[0].1[1], json!("latest"));
        Ok(())
    }

    #[tokio::test]
    async fn mint_sends_transaction_and_polls_receipt() -> anyhow::Result<()> {
        let hash = format!("0x{}", "cd".repeat(32));
        let transport = ScriptedTransport::default();
        transport
            .reply("eth_sendTransaction", Ok(json!(hash)))
            .reply("eth_getTransactionReceipt", Ok(Value::Null))
            .reply("eth_getTransactionReceipt", Ok(Value::Null))
            .reply(
                "eth_getTransactionReceipt",
                Ok(json!({ "transactionHash": hash, "blockNumber": "0x10", "status": "0x1" })),
            );
        let contract = contract(&transport);

        let tx_hash = contract.submit_mint(&Address::parse(ACCOUNT)?).await?;
        let receipt = contract.wait_for_confirmation(&tx_hash).await?;

        assert_eq!(receipt.block_number, 16);
        assert_eq!(receipt.status, TxStatus::Confirmed);
        assert_eq!(transport.script.borrow().pauses, 2);
        let calls = transport.calls();
        assert_eq!(calls[0].1[0]["from"], json!(ACCOUNT));
        assert_eq!(calls[0].1[0]["data"], json!("0xde9d132f"));
        Ok(())
    }

    #[tokio::test]
    async fn reverted_receipt_is_reported() -> anyhow::Result<()> {
        let hash = format!("0x{}", "ef".repeat(32));
        let transport = ScriptedTransport::default();
        transport.reply(
            "eth_getTransactionReceipt",
            Ok(json!({ "transactionHash": hash, "blockNumber": "0x2", "status": "0x0" })),
        );
        let receipt = contract(&transport)
            .wait_for_confirmation(&TxHash::parse(&hash)?)
            .await?;
        assert_eq!(receipt.status, TxStatus::Reverted);
        Ok(())
    }

    #[tokio::test]
    async fn subscription_yields_new_logs_from_next_block() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport
            .reply("eth_blockNumber", Ok(json!("0x64")))
            .reply("eth_blockNumber", Ok(json!("0x64")))
            .reply("eth_blockNumber", Ok(json!("0x66")))
            .reply("eth_getLogs", Ok(json!([mint_log(3), mint_log(4)])));

        let mut subscription = contract(&transport).subscribe_mint_events().await?;
        let first = subscription.events.next().await;
        let second = subscription.events.next().await;

        assert_eq!(first.map(|event| event.token_id), Some(TokenId(3)));
        assert_eq!(second.map(|event| event.token_id), Some(TokenId(4)));

        let calls = transport.calls();
        let filter = &calls[3].1[0];
        assert_eq!(filter["fromBlock"], json!("0x65"));
        assert_eq!(filter["toBlock"], json!("0x66"));
        assert_eq!(filter["topics"][0], json!(MINT_EVENT_TOPIC));
        Ok(())
    }

    #[tokio::test]
    async fn unsubscribed_stream_ends() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport.reply("eth_blockNumber", Ok(json!("0x1")));

        let MintEventSubscription { mut events, handle } =
            contract(&transport).subscribe_mint_events().await?;
        handle.unsubscribe();

        assert!(events.next().await.is_none());
        assert_eq!(transport.calls().len(), 1);
        Ok(())
    }
}
