//! Ledger transaction script model.
//!
//! A script is a sequence of typed commands over a table of inputs. Pure
//! inputs are restricted to unsigned integers, booleans and addresses, so a
//! human decimal cannot cross this boundary.
//!
//! Scripts are only produced by [`ScriptBuilder::finish`], which rejects any
//! object produced inside the script that was never routed to a later
//! command (e.g. a swap residual that was not transferred back).

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::ids::{Address, ObjectId, ObjectRef, SharedObjectRef, TypeTag};

static NEXT_SCRIPT_ID: AtomicU64 = AtomicU64::new(1);

fn serialize_u128_str<S: Serializer>(v: &u128, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&v.to_string())
}

/// Script construction errors. All of these are build-time defects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("result {index} of command {command} is never routed")]
    UnroutedResult { command: u16, index: u16 },

    #[error("trade proof from script {proof_script} used in script {script}")]
    ForeignProof { proof_script: u64, script: u64 },

    #[error("argument {0:?} does not refer to an earlier command or input")]
    DanglingArgument(Argument),

    #[error("script has no commands")]
    Empty,

    #[error("script exceeds {0} entries")]
    TooLarge(usize),
}

impl ScriptError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

/// Pure (non-object) input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PureArg {
    U8(u8),
    U64(u64),
    U128(#[serde(serialize_with = "serialize_u128_str")] u128),
    Bool(bool),
    Address(Address),
}

/// Object input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "ownership", rename_all = "lowercase")]
pub enum ObjectArg {
    Owned(ObjectRef),
    Shared(SharedObjectRef),
}

impl ObjectArg {
    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::Owned(r) => r.object_id,
            Self::Shared(r) => r.object_id,
        }
    }
}

/// Entry in the input table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CallArg {
    Pure(PureArg),
    Object(ObjectArg),
}

/// Reference to a value available to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Argument {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

/// Three-part call target: package, module, function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallTarget {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
}

impl CallTarget {
    pub fn new(package: ObjectId, module: &str, function: &str) -> Self {
        Self {
            package,
            module: module.to_string(),
            function: function.to_string(),
        }
    }
}

/// Kind of value returned by a call. Objects must be routed, values may be
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Object,
    Value,
}

/// One script command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command")]
pub enum Command {
    MoveCall {
        target: CallTarget,
        type_args: Vec<TypeTag>,
        args: Vec<Argument>,
        outputs: Vec<OutputKind>,
    },
    SplitCoins {
        coin: Argument,
        amounts: Vec<Argument>,
    },
    MergeCoins {
        destination: Argument,
        sources: Vec<Argument>,
    },
    TransferObjects {
        objects: Vec<Argument>,
        recipient: Argument,
    },
}

/// Transaction-scoped authorization value.
///
/// Bound to the script that generated it and consumed by value, so it can be
/// neither copied nor carried into another transaction.
#[derive(Debug)]
pub struct TradeProof {
    script_id: u64,
    argument: Argument,
}

impl TradeProof {
    pub fn script_id(&self) -> u64 {
        self.script_id
    }
}

/// A finished, validated script ready for the signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerTransactionScript {
    id: u64,
    sender: Address,
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
}

impl LedgerTransactionScript {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn inputs(&self) -> &[CallArg] {
        &self.inputs
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn input(&self, arg: Argument) -> Option<&CallArg> {
        match arg {
            Argument::Input(i) => self.inputs.get(usize::from(i)),
            _ => None,
        }
    }

    /// First move call to `module::function`, with its command index.
    pub fn find_call(&self, module: &str, function: &str) -> Option<(usize, &Command)> {
        self.commands.iter().enumerate().find(|(_, c)| {
            matches!(c, Command::MoveCall { target, .. }
                if target.module == module && target.function == function)
        })
    }

    /// Number of move calls in the script.
    pub fn move_call_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::MoveCall { .. }))
            .count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Incremental builder for [`LedgerTransactionScript`].
#[derive(Debug)]
pub struct ScriptBuilder {
    id: u64,
    sender: Address,
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
    object_inputs: HashMap<ObjectId, u16>,
    /// Object outputs not yet moved into a later command.
    unrouted: BTreeSet<(u16, u16)>,
}

impl ScriptBuilder {
    pub fn new(sender: Address) -> Self {
        Self {
            id: NEXT_SCRIPT_ID.fetch_add(1, Ordering::Relaxed),
            sender,
            inputs: Vec::new(),
            commands: Vec::new(),
            object_inputs: HashMap::new(),
            unrouted: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    fn push_input(&mut self, arg: CallArg) -> Result<Argument, ScriptError> {
        let idx = u16::try_from(self.inputs.len()).map_err(|_| ScriptError::TooLarge(u16::MAX as usize))?;
        self.inputs.push(arg);
        Ok(Argument::Input(idx))
    }

    pub fn pure(&mut self, value: PureArg) -> Result<Argument, ScriptError> {
        self.push_input(CallArg::Pure(value))
    }

    /// Add an object input; the same object is only ever listed once.
    pub fn object(&mut self, object: ObjectArg) -> Result<Argument, ScriptError> {
        let id = object.object_id();
        if let Some(idx) = self.object_inputs.get(&id) {
            return Ok(Argument::Input(*idx));
        }
        let arg = self.push_input(CallArg::Object(object))?;
        if let Argument::Input(idx) = arg {
            self.object_inputs.insert(id, idx);
        }
        Ok(arg)
    }

    fn next_command_index(&self) -> Result<u16, ScriptError> {
        u16::try_from(self.commands.len()).map_err(|_| ScriptError::TooLarge(u16::MAX as usize))
    }

    fn check(&self, arg: Argument) -> Result<(), ScriptError> {
        let ok = match arg {
            Argument::GasCoin => true,
            Argument::Input(i) => usize::from(i) < self.inputs.len(),
            Argument::Result(c) | Argument::NestedResult(c, _) => {
                usize::from(c) < self.commands.len()
            }
        };
        if ok {
            Ok(())
        } else {
            Err(ScriptError::DanglingArgument(arg))
        }
    }

    fn consume(&mut self, arg: Argument) {
        match arg {
            Argument::NestedResult(c, i) => {
                self.unrouted.remove(&(c, i));
            }
            Argument::Result(c) => {
                self.unrouted.retain(|(cmd, _)| *cmd != c);
            }
            Argument::GasCoin | Argument::Input(_) => {}
        }
    }

    /// Emit a move call. Returns one argument per declared output.
    pub fn move_call(
        &mut self,
        target: CallTarget,
        type_args: Vec<TypeTag>,
        args: Vec<Argument>,
        outputs: Vec<OutputKind>,
    ) -> Result<Vec<Argument>, ScriptError> {
        for arg in &args {
            self.check(*arg)?;
        }
        let cmd = self.next_command_index()?;
        for arg in &args {
            self.consume(*arg);
        }
        let results = outputs
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let i = i as u16;
                if *kind == OutputKind::Object {
                    self.unrouted.insert((cmd, i));
                }
                Argument::NestedResult(cmd, i)
            })
            .collect();
        self.commands.push(Command::MoveCall {
            target,
            type_args,
            args,
            outputs,
        });
        Ok(results)
    }

    /// Emit a call whose single value output is a trade proof.
    pub fn trade_proof_call(
        &mut self,
        target: CallTarget,
        args: Vec<Argument>,
    ) -> Result<TradeProof, ScriptError> {
        let results = self.move_call(target, vec![], args, vec![OutputKind::Value])?;
        let argument = results
            .first()
            .copied()
            .ok_or(ScriptError::Empty)?;
        Ok(TradeProof {
            script_id: self.id,
            argument,
        })
    }

    /// Take a proof for use as a call argument. Fails if it belongs to
    /// another script.
    pub fn use_proof(&self, proof: TradeProof) -> Result<Argument, ScriptError> {
        if proof.script_id != self.id {
            return Err(ScriptError::ForeignProof {
                proof_script: proof.script_id,
                script: self.id,
            });
        }
        Ok(proof.argument)
    }

    /// Split `amounts` off `coin`. The source coin is borrowed, the new coins
    /// must be routed.
    pub fn split_coins(
        &mut self,
        coin: Argument,
        amounts: &[u64],
    ) -> Result<Vec<Argument>, ScriptError> {
        self.check(coin)?;
        let mut amount_args = Vec::with_capacity(amounts.len());
        for amount in amounts {
            amount_args.push(self.pure(PureArg::U64(*amount))?);
        }
        let cmd = self.next_command_index()?;
        let results = (0..amounts.len() as u16)
            .map(|i| {
                self.unrouted.insert((cmd, i));
                Argument::NestedResult(cmd, i)
            })
            .collect();
        self.commands.push(Command::SplitCoins {
            coin,
            amounts: amount_args,
        });
        Ok(results)
    }

    /// Merge `sources` into `destination`. Sources are consumed.
    pub fn merge_coins(
        &mut self,
        destination: Argument,
        sources: Vec<Argument>,
    ) -> Result<(), ScriptError> {
        self.check(destination)?;
        for src in &sources {
            self.check(*src)?;
        }
        for src in &sources {
            self.consume(*src);
        }
        self.commands.push(Command::MergeCoins {
            destination,
            sources,
        });
        Ok(())
    }

    /// Transfer `objects` to `recipient`.
    pub fn transfer_objects(
        &mut self,
        objects: Vec<Argument>,
        recipient: Address,
    ) -> Result<(), ScriptError> {
        for obj in &objects {
            self.check(*obj)?;
        }
        let recipient = self.pure(PureArg::Address(recipient))?;
        for obj in &objects {
            self.consume(*obj);
        }
        self.commands.push(Command::TransferObjects { objects, recipient });
        Ok(())
    }

    /// Object outputs that are still waiting to be routed.
    pub fn unrouted(&self) -> Vec<Argument> {
        self.unrouted
            .iter()
            .map(|(c, i)| Argument::NestedResult(*c, *i))
            .collect()
    }

    /// Validate and seal the script.
    pub fn finish(self) -> Result<LedgerTransactionScript, ScriptError> {
        if self.commands.is_empty() {
            return Err(ScriptError::Empty);
        }
        if let Some((command, index)) = self.unrouted.iter().next() {
            return Err(ScriptError::UnroutedResult {
                command: *command,
                index: *index,
            });
        }
        Ok(LedgerTransactionScript {
            id: self.id,
            sender: self.sender,
            inputs: self.inputs,
            commands: self.commands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(function: &str) -> CallTarget {
        CallTarget::new(ObjectId::from_low_byte(0xdb), "pool", function)
    }

    fn sender() -> Address {
        "0x5".parse().unwrap()
    }

    #[test]
    fn test_unrouted_object_output_is_rejected() {
        let mut b = ScriptBuilder::new(sender());
        let coin = b.split_coins(Argument::GasCoin, &[100]).unwrap();
        let outs = b
            .move_call(
                target("swap_exact_base_for_quote"),
                vec![],
                coin,
                vec![OutputKind::Object; 3],
            )
            .unwrap();
        // Route only two of three residuals.
        b.transfer_objects(outs[..2].to_vec(), sender()).unwrap();
        let err = b.finish().unwrap_err();
        assert_eq!(
            err,
            ScriptError::UnroutedResult {
                command: 1,
                index: 2
            }
        );
    }

    #[test]
    fn test_fully_routed_script_finishes() {
        let mut b = ScriptBuilder::new(sender());
        let coin = b.split_coins(Argument::GasCoin, &[100]).unwrap();
        let outs = b
            .move_call(target("swap"), vec![], coin, vec![OutputKind::Object; 3])
            .unwrap();
        b.transfer_objects(outs, sender()).unwrap();
        let script = b.finish().unwrap();
        assert_eq!(script.commands().len(), 3);
        assert!(script.find_call("pool", "swap").is_some());
    }

    #[test]
    fn test_value_outputs_may_be_dropped() {
        let mut b = ScriptBuilder::new(sender());
        b.move_call(target("noop"), vec![], vec![], vec![OutputKind::Value])
            .unwrap();
        assert!(b.finish().is_ok());
    }

    #[test]
    fn test_proof_is_bound_to_its_script() {
        let mut first = ScriptBuilder::new(sender());
        let proof = first.trade_proof_call(target("proof"), vec![]).unwrap();

        let second = ScriptBuilder::new(sender());
        let err = second.use_proof(proof).unwrap_err();
        assert!(matches!(err, ScriptError::ForeignProof { .. }));

        let proof = first.trade_proof_call(target("proof"), vec![]).unwrap();
        assert!(first.use_proof(proof).is_ok());
    }

    #[test]
    fn test_object_inputs_are_deduplicated() {
        let mut b = ScriptBuilder::new(sender());
        let clock = SharedObjectRef::new(ObjectId::from_low_byte(6), 1, false);
        let a = b.object(ObjectArg::Shared(clock)).unwrap();
        let c = b.object(ObjectArg::Shared(clock)).unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn test_dangling_argument() {
        let mut b = ScriptBuilder::new(sender());
        let err = b
            .move_call(target("x"), vec![], vec![Argument::Result(4)], vec![])
            .unwrap_err();
        assert_eq!(err, ScriptError::DanglingArgument(Argument::Result(4)));
    }

    #[test]
    fn test_empty_script() {
        assert_eq!(
            ScriptBuilder::new(sender()).finish().unwrap_err(),
            ScriptError::Empty
        );
    }

    #[test]
    fn test_u128_serializes_as_string() {
        let json = serde_json::to_string(&PureArg::U128(u128::MAX)).unwrap();
        assert!(json.contains(&format!("\"{}\"", u128::MAX)));
    }
}
