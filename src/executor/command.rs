use std::borrow::Borrow;

use crate::error::SqlCommandError;
use crate::mapper::{PropertyValue, Record, extract_properties};
use crate::parameter::{BoundParameter, SqlParameter, bind_parameter};

use super::Executor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Command text is SQL executed as written
    Text,
    /// Command text names a registered procedure
    StoredProcedure,
}

/// The executor's current command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandState {
    text: String,
    kind: CommandKind,
    parameters: Vec<BoundParameter>,
    timeout_ms: Option<u64>,
    transaction_id: Option<u64>,
}

impl CommandState {
    fn new(text: String, kind: CommandKind, transaction_id: Option<u64>) -> Self {
        Self {
            text,
            kind,
            parameters: Vec::new(),
            timeout_ms: None,
            transaction_id,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Parameters bound so far, in binding order.
    #[must_use]
    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&BoundParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    /// Id of the transaction this command is associated with.
    #[must_use]
    pub fn transaction_id(&self) -> Option<u64> {
        self.transaction_id
    }

    pub(crate) fn set_transaction(&mut self, transaction_id: Option<u64>) {
        self.transaction_id = transaction_id;
    }

    fn attach(&mut self, bound: Vec<BoundParameter>) {
        for param in bound {
            if let Some(existing) = self.parameters.iter_mut().find(|p| p.name == param.name) {
                tracing::debug!(parameter = %param.name, "parameter rebound");
                *existing = param;
            } else {
                self.parameters.push(param);
            }
        }
    }
}

impl Executor {
    /// Replace the current command with a direct-text command.
    ///
    /// Parameters bound to the previous command are discarded. The new command
    /// joins the active transaction, if any.
    pub fn set_command_text(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        let transaction_id = self.transaction_id();
        tracing::debug!(sql = %text, ?transaction_id, "command created");
        self.command = Some(CommandState::new(text, CommandKind::Text, transaction_id));
        self
    }

    /// Replace the current command with a stored procedure call.
    pub fn set_stored_procedure(&mut self, name: impl Into<String>) -> &mut Self {
        self.set_command_text(name);
        if let Some(command) = self.command.as_mut() {
            command.kind = CommandKind::StoredProcedure;
        }
        self
    }

    /// The current command, if one has been set.
    #[must_use]
    pub fn command(&self) -> Option<&CommandState> {
        self.command.as_ref()
    }

    pub(crate) fn command_mut(&mut self) -> Result<&mut CommandState, SqlCommandError> {
        self.command
            .as_mut()
            .ok_or(SqlCommandError::CommandNotCreated)
    }

    /// Bind every field of a parameters record; each field must hold a [`SqlParameter`].
    ///
    /// # Errors
    /// Returns `SqlCommandError::CommandNotCreated` without a current command, or
    /// `SqlCommandError::InvalidParameterType` naming the first field that is not a
    /// descriptor. Nothing is bound when an error is returned.
    pub fn with_parameters<R: Record + ?Sized>(
        &mut self,
        params: &R,
    ) -> Result<&mut Self, SqlCommandError> {
        self.command_mut()?;
        let mut descriptors = Vec::new();
        for (name, value) in extract_properties(params) {
            match value {
                PropertyValue::Parameter(param) => descriptors.push((name, param)),
                PropertyValue::Value(_) => {
                    return Err(SqlCommandError::InvalidParameterType(name.to_string()));
                }
            }
        }
        self.with_dictionary_parameters(descriptors)
    }

    /// Bind named descriptors to the current command.
    ///
    /// Bindings accumulate across calls on the same command; binding a name
    /// again replaces its earlier value.
    ///
    /// # Errors
    /// Returns `SqlCommandError::CommandNotCreated` without a current command, or
    /// `SqlCommandError::ParameterError` if a name is malformed or a value does
    /// not fit its declared type. Nothing is bound when an error is returned.
    pub fn with_dictionary_parameters<I, K, P>(
        &mut self,
        params: I,
    ) -> Result<&mut Self, SqlCommandError>
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Borrow<SqlParameter>,
    {
        let command = self.command_mut()?;
        let bound = params
            .into_iter()
            .map(|(name, param)| bind_parameter(name.as_ref(), param.borrow()))
            .collect::<Result<Vec<_>, _>>()?;
        for param in &bound {
            tracing::debug!(
                parameter = %param.name,
                sql_type = %param.sql_type.name(),
                size = ?param.size,
                null = param.is_null(),
                "parameter bound"
            );
        }
        command.attach(bound);
        Ok(self)
    }

    /// Set the current command's timeout in milliseconds.
    ///
    /// # Errors
    /// Returns `SqlCommandError::CommandNotCreated` without a current command.
    pub fn with_timeout(&mut self, timeout_ms: u64) -> Result<&mut Self, SqlCommandError> {
        self.command_mut()?.timeout_ms = Some(timeout_ms);
        Ok(self)
    }

    /// SQL to prepare for the current command, resolving procedure names.
    pub(crate) fn resolve_sql(&self, command: &CommandState) -> Result<String, SqlCommandError> {
        match command.kind {
            CommandKind::Text => Ok(command.text.clone()),
            CommandKind::StoredProcedure => self
                .options
                .procedures
                .get(&command.text)
                .cloned()
                .ok_or_else(|| SqlCommandError::UnknownProcedure(command.text.clone())),
        }
    }
}
