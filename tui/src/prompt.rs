use async_trait::async_trait;
use presale_core::chain::{SignRequest, SignaturePrompt};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// A transaction waiting for the user to sign or decline.
pub struct PendingSignature {
    pub request: SignRequest,
    reply: oneshot::Sender<bool>,
}

impl PendingSignature {
    pub fn answer(self, approved: bool) {
        debug!(approved, "signature prompt answered for {}", self.request.call);
        // the requesting task may already be gone
        let _ = self.reply.send(approved);
    }
}

/// Forwards sign requests to the UI thread, which shows them as a modal.
pub struct ChannelPrompt {
    requests: mpsc::UnboundedSender<PendingSignature>,
}

impl ChannelPrompt {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingSignature>) {
        let (requests, rx) = mpsc::unbounded_channel();
        (Self { requests }, rx)
    }
}

#[async_trait]
impl SignaturePrompt for ChannelPrompt {
    async fn confirm(&self, request: &SignRequest) -> bool {
        let (reply, answer) = oneshot::channel();
        let pending = PendingSignature {
            request: request.clone(),
            reply,
        };
        if self.requests.send(pending).is_err() {
            return false;
        }
        answer.await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presale_core::chain::ContractCall;
    use presale_core::gas::GasSettings;
    use presale_core::{Address, U256};

    fn request() -> SignRequest {
        SignRequest {
            call: ContractCall::HarvestRewards {
                stake_id: U256::one(),
            },
            from: Address::repeat_byte(1),
            to: Address::repeat_byte(2),
            gas: GasSettings {
                gas_price: U256::from(85u64),
                gas_limit: None,
            },
        }
    }

    #[tokio::test]
    async fn answer_reaches_the_signer() {
        let (prompt, mut rx) = ChannelPrompt::new();
        let ui = tokio::spawn(async move {
            let pending = rx.recv().await.unwrap();
            pending.answer(false);
        });
        assert!(!prompt.confirm(&request()).await);
        ui.await.unwrap();
    }

    #[tokio::test]
    async fn closed_ui_declines() {
        let (prompt, rx) = ChannelPrompt::new();
        drop(rx);
        assert!(!prompt.confirm(&request()).await);
    }
}
