//! Closed vocabularies of the GNS3 REST API.
//!
//! The server validates these values on its side; mirroring them as enums makes an
//! unexpected value fail at decode time instead of deep inside user code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Macro to generate an enum whose variants map one-to-one onto API strings.
macro_rules! api_enum {
    (
        $(#[$meta:meta])* $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            /// Returns the string used for this value by the GNS3 API.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Returns all known values.
            #[must_use]
            pub const fn all() -> &'static [Self] {
                &[$(Self::$variant,)+]
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(Error::ValidationError(format!(
                        "Unknown {} `{s}`",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

api_enum!(
    /// Emulator or builtin device backing a node (also used as a template's type).
    NodeType {
        /// Cloud bridging to host interfaces
        Cloud => "cloud",
        /// NAT to the host network
        Nat => "nat",
        /// Builtin Ethernet hub
        EthernetHub => "ethernet_hub",
        /// Builtin Ethernet switch
        EthernetSwitch => "ethernet_switch",
        /// Builtin Frame Relay switch
        FrameRelaySwitch => "frame_relay_switch",
        /// Builtin ATM switch
        AtmSwitch => "atm_switch",
        /// Docker container
        Docker => "docker",
        /// Dynamips (Cisco IOS) router
        Dynamips => "dynamips",
        /// Virtual PC simulator
        Vpcs => "vpcs",
        /// TraceNG host
        Traceng => "traceng",
        /// VirtualBox VM
        Virtualbox => "virtualbox",
        /// VMware VM
        Vmware => "vmware",
        /// IOS on Unix
        Iou => "iou",
        /// QEMU VM
        Qemu => "qemu",
    }
);

api_enum!(
    /// Run state of a node.
    NodeStatus {
        /// Node is running
        Started => "started",
        /// Node is stopped
        Stopped => "stopped",
        /// Node is paused
        Suspended => "suspended",
    }
);

api_enum!(
    /// Console protocol exposed by a node.
    ConsoleType {
        /// VNC console
        Vnc => "vnc",
        /// Telnet console
        Telnet => "telnet",
        /// HTTP console
        Http => "http",
        /// HTTPS console
        Https => "https",
        /// SPICE console
        Spice => "spice",
        /// SPICE console with agent
        SpiceAgent => "spice+agent",
        /// No console
        None => "none",
    }
);

api_enum!(
    /// Open state of a project.
    ProjectStatus {
        /// Project is loaded on the server
        Opened => "opened",
        /// Project is closed
        Closed => "closed",
    }
);

api_enum!(
    /// Layer-2 type of a link.
    LinkType {
        /// Ethernet link
        Ethernet => "ethernet",
        /// Serial link
        Serial => "serial",
    }
);

api_enum!(
    /// Category a template is listed under.
    TemplateCategory {
        /// Routers
        Router => "router",
        /// Switches
        Switch => "switch",
        /// End hosts
        Guest => "guest",
        /// Security devices
        Firewall => "firewall",
    }
);
