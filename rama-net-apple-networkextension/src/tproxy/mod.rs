mod engine;
mod types;

pub use self::{
    engine::{
        TransparentProxyEngine, TransparentProxyEngineBuilder, TransparentProxyTcpSession,
        TransparentProxyUdpSession,
    },
    types::{
        TransparentProxyConfig, TransparentProxyFlowMeta, TransparentProxyFlowProtocol,
        TransparentProxyNetworkRule, TransparentProxyRuleProtocol,
        TransparentProxyTrafficDirection,
    },
};
