//! ERC-20 calldata encoding and decoding.
//!
//! Only the three state-changing ERC-20 calls the planner and risk analyzer
//! care about are supported. Call types come from `sol!`, so selectors and
//! word layout are the standard ABI ones.
//!
//! Decoding is lenient the way a token contract is: trailing bytes after the
//! last argument are ignored, and an address word keeps only its low 160 bits.
//! Legacy tokens compiled with the v1 ABI decoder mask dirty upper bytes
//! instead of reverting, so calldata with a dirty spender word still grants
//! an allowance and must still decode.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use thiserror::Error;

sol! {
    function approve(address spender, uint256 amount) external returns (bool);
    function transfer(address to, uint256 amount) external returns (bool);
    function transferFrom(address from, address to, uint256 amount) external returns (bool);
}

pub const APPROVE_SIGNATURE: &str = approveCall::SIGNATURE;
pub const TRANSFER_SIGNATURE: &str = transferCall::SIGNATURE;
pub const TRANSFER_FROM_SIGNATURE: &str = transferFromCall::SIGNATURE;

const WORD: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("calldata is {len} bytes, too short for a function selector")]
    MissingSelector { len: usize },

    #[error("unknown function selector 0x{selector}")]
    UnknownSelector { selector: String },

    #[error("{function} needs {expected} argument bytes, got {actual}")]
    Truncated {
        function: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{function} arguments do not decode: {reason}")]
    Abi { function: &'static str, reason: String },
}

/// A decoded (or to-be-encoded) ERC-20 call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Erc20Call {
    Approve { spender: Address, amount: U256 },
    Transfer { to: Address, amount: U256 },
    TransferFrom { from: Address, to: Address, amount: U256 },
}

impl Erc20Call {
    pub fn function_name(&self) -> &'static str {
        match self {
            Erc20Call::Approve { .. } => "approve",
            Erc20Call::Transfer { .. } => "transfer",
            Erc20Call::TransferFrom { .. } => "transferFrom",
        }
    }

    pub fn signature(&self) -> &'static str {
        match self {
            Erc20Call::Approve { .. } => APPROVE_SIGNATURE,
            Erc20Call::Transfer { .. } => TRANSFER_SIGNATURE,
            Erc20Call::TransferFrom { .. } => TRANSFER_FROM_SIGNATURE,
        }
    }

    pub fn selector(&self) -> [u8; 4] {
        match self {
            Erc20Call::Approve { .. } => approveCall::SELECTOR,
            Erc20Call::Transfer { .. } => transferCall::SELECTOR,
            Erc20Call::TransferFrom { .. } => transferFromCall::SELECTOR,
        }
    }

    /// ABI-encode the call, selector included.
    pub fn encode(&self) -> Bytes {
        let encoded = match self {
            Erc20Call::Approve { spender, amount } => approveCall {
                spender: *spender,
                amount: *amount,
            }
            .abi_encode(),
            Erc20Call::Transfer { to, amount } => transferCall {
                to: *to,
                amount: *amount,
            }
            .abi_encode(),
            Erc20Call::TransferFrom { from, to, amount } => transferFromCall {
                from: *from,
                to: *to,
                amount: *amount,
            }
            .abi_encode(),
        };
        Bytes::from(encoded)
    }

    /// Decode calldata produced by `encode` (or by any ABI encoder).
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < 4 {
            return Err(CodecError::MissingSelector { len: data.len() });
        }
        let (head, args) = data.split_at(4);

        if head == approveCall::SELECTOR {
            let call: approveCall = decode_args("approve", args, 2)?;
            Ok(Erc20Call::Approve {
                spender: call.spender,
                amount: call.amount,
            })
        } else if head == transferCall::SELECTOR {
            let call: transferCall = decode_args("transfer", args, 2)?;
            Ok(Erc20Call::Transfer {
                to: call.to,
                amount: call.amount,
            })
        } else if head == transferFromCall::SELECTOR {
            let call: transferFromCall = decode_args("transferFrom", args, 3)?;
            Ok(Erc20Call::TransferFrom {
                from: call.from,
                to: call.to,
                amount: call.amount,
            })
        } else {
            Err(CodecError::UnknownSelector {
                selector: alloy_primitives::hex::encode(head),
            })
        }
    }
}

/// Decode `words` static arguments without validation, so dirty address
/// bits are masked and trailing bytes are ignored.
fn decode_args<C: SolCall>(function: &'static str, args: &[u8], words: usize) -> Result<C, CodecError> {
    let expected = words * WORD;
    if args.len() < expected {
        return Err(CodecError::Truncated {
            function,
            expected,
            actual: args.len(),
        });
    }
    C::abi_decode_raw(&args[..expected], false).map_err(|e| CodecError::Abi {
        function,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spender() -> Address {
        "0x1111111111111111111111111111111111111111".parse().unwrap()
    }

    #[test]
    fn selectors_match_erc20_abi() {
        assert_eq!(APPROVE_SIGNATURE, "approve(address,uint256)");
        assert_eq!(TRANSFER_FROM_SIGNATURE, "transferFrom(address,address,uint256)");
        assert_eq!(approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(transferCall::SELECTOR, [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(transferFromCall::SELECTOR, [0x23, 0xb8, 0x72, 0xdd]);
    }

    #[test]
    fn approve_encodes_to_selector_and_two_words() {
        let call = Erc20Call::Approve { spender: spender(), amount: U256::from(1_000u64) };
        let data = call.encode();

        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[..4], &call.selector());
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..36], spender().as_slice());
        assert_eq!(
            alloy_primitives::hex::encode(&data[36..]),
            format!("{:064x}", 1_000u64)
        );
    }

    #[test]
    fn approve_round_trips_with_max_amount() {
        let call = Erc20Call::Approve { spender: spender(), amount: U256::MAX };
        let decoded = Erc20Call::decode(&call.encode()).unwrap();
        assert_eq!(decoded.function_name(), "approve");
        assert_eq!(decoded, call);
    }

    #[test]
    fn transfer_from_round_trips() {
        let call = Erc20Call::TransferFrom {
            from: Address::with_last_byte(1),
            to: Address::with_last_byte(2),
            amount: U256::from(3u64),
        };
        assert_eq!(Erc20Call::decode(&call.encode()).unwrap(), call);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let call = Erc20Call::Transfer { to: spender(), amount: U256::from(5u64) };
        let mut data = call.encode().to_vec();
        data.extend_from_slice(&[0xde, 0xad]);
        assert_eq!(Erc20Call::decode(&data).unwrap(), call);
    }

    #[test]
    fn dirty_address_word_keeps_low_160_bits() {
        let call = Erc20Call::Approve { spender: spender(), amount: U256::MAX };
        let mut dirty = call.encode().to_vec();
        dirty[4] = 0x01;
        dirty[15] = 0xff;
        assert_eq!(Erc20Call::decode(&dirty).unwrap(), call);
    }

    #[test]
    fn decode_errors() {
        assert_eq!(
            Erc20Call::decode(&[0x09, 0x5e]),
            Err(CodecError::MissingSelector { len: 2 })
        );
        assert!(matches!(
            Erc20Call::decode(&[0xde, 0xad, 0xbe, 0xef]),
            Err(CodecError::UnknownSelector { .. })
        ));

        let encoded = Erc20Call::Approve { spender: spender(), amount: U256::MAX }.encode();
        assert!(matches!(
            Erc20Call::decode(&encoded[..40]),
            Err(CodecError::Truncated { function: "approve", expected: 64, actual: 36 })
        ));
    }
}
