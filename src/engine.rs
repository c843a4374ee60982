// Regras do workflow sem acesso a banco: os services carregam as linhas,
// chamam estas funções e gravam o resultado dentro de uma transação.
pub mod aggregation;
pub mod definition;
pub mod gps;
pub mod pipeline;
pub mod vendor_work;

#[cfg(test)]
mod scenarios;
