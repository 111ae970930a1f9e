//! Site recovery replicated-VM topology.
//!
//! Two resource groups, a recovery vault, a fabric and protection container
//! per side, a replication policy, container and network mappings, source
//! and target networks, a source VM with its NIC and OS disk, a staging
//! storage account, and the replicated VM itself.
//!
//! The replicated VM carries explicit `depends_on` edges on both mappings.
//! Nothing in its properties refers to them, but the remote API rejects the
//! replication request until they exist.

use sitecheck_types::ResourceAddress;

use crate::error::TopologyResult;
use crate::graph::Topology;
use crate::node::{Block, PropertyValue, ResourceNode};
use crate::params::TopologyParams;

pub const PROVIDER: &str = "azurerm";

pub const RESOURCE_GROUP: &str = "azurerm_resource_group";
pub const RECOVERY_VAULT: &str = "azurerm_recovery_services_vault";
pub const FABRIC: &str = "azurerm_site_recovery_fabric";
pub const PROTECTION_CONTAINER: &str = "azurerm_site_recovery_protection_container";
pub const REPLICATION_POLICY: &str = "azurerm_site_recovery_replication_policy";
pub const CONTAINER_MAPPING: &str = "azurerm_site_recovery_protection_container_mapping";
pub const NETWORK_MAPPING: &str = "azurerm_site_recovery_network_mapping";
pub const VIRTUAL_NETWORK: &str = "azurerm_virtual_network";
pub const SUBNET: &str = "azurerm_subnet";
pub const NETWORK_INTERFACE: &str = "azurerm_network_interface";
pub const VIRTUAL_MACHINE: &str = "azurerm_virtual_machine";
pub const STORAGE_ACCOUNT: &str = "azurerm_storage_account";
pub const REPLICATED_VM: &str = "azurerm_site_recovery_replicated_vm";

/// Logical name of the replicated VM inside the topology.
pub const REPLICATED_VM_NAME: &str = "test";

/// Address of the replicated VM the verifiers track.
pub fn replicated_vm_address() -> ResourceAddress {
    ResourceAddress::new(REPLICATED_VM, REPLICATED_VM_NAME)
}

/// Subnet name the replicated VM's network interface fails over into.
pub fn expected_target_subnet(params: &TopologyParams) -> String {
    format!("snet-{}_2", params.unique_suffix)
}

/// Build the replicated-VM topology. Names and locations are templates
/// resolved at render time.
pub fn recovery_topology() -> TopologyResult<Topology> {
    let rg_primary = ResourceNode::new(RESOURCE_GROUP, "test")
        .with("name", "acctestRG-recovery-{unique_suffix}-1")
        .with("location", "{primary_location}");

    let rg_secondary = ResourceNode::new(RESOURCE_GROUP, "test2")
        .with("name", "acctestRG-recovery-{unique_suffix}-2")
        .with("location", "{secondary_location}");

    let vault = ResourceNode::new(RECOVERY_VAULT, "test")
        .with("name", "acctest-vault-{unique_suffix}")
        .with("location", rg_secondary.attr("location"))
        .with("resource_group_name", rg_secondary.attr("name"))
        .with("sku", "Standard")
        .with("soft_delete_enabled", false);

    let fabric_primary = ResourceNode::new(FABRIC, "test1")
        .with("resource_group_name", rg_secondary.attr("name"))
        .with("recovery_vault_name", vault.attr("name"))
        .with("name", "acctest-fabric1-{unique_suffix}")
        .with("location", rg_primary.attr("location"));

    let fabric_secondary = ResourceNode::new(FABRIC, "test2")
        .with("resource_group_name", rg_secondary.attr("name"))
        .with("recovery_vault_name", vault.attr("name"))
        .with("name", "acctest-fabric2-{unique_suffix}")
        .with("location", rg_secondary.attr("location"))
        .depends_on(&fabric_primary.address);

    let container_primary = ResourceNode::new(PROTECTION_CONTAINER, "test1")
        .with("resource_group_name", rg_secondary.attr("name"))
        .with("recovery_vault_name", vault.attr("name"))
        .with("recovery_fabric_name", fabric_primary.attr("name"))
        .with("name", "acctest-protection-cont1-{unique_suffix}");

    let container_secondary = ResourceNode::new(PROTECTION_CONTAINER, "test2")
        .with("resource_group_name", rg_secondary.attr("name"))
        .with("recovery_vault_name", vault.attr("name"))
        .with("recovery_fabric_name", fabric_secondary.attr("name"))
        .with("name", "acctest-protection-cont2-{unique_suffix}");

    let policy = ResourceNode::new(REPLICATION_POLICY, "test")
        .with("resource_group_name", rg_secondary.attr("name"))
        .with("recovery_vault_name", vault.attr("name"))
        .with("name", "acctest-policy-{unique_suffix}")
        .with("recovery_point_retention_in_minutes", 24 * 60_i64)
        .with("application_consistent_snapshot_frequency_in_minutes", 4 * 60_i64);

    let container_mapping = ResourceNode::new(CONTAINER_MAPPING, "test")
        .with("resource_group_name", rg_secondary.attr("name"))
        .with("recovery_vault_name", vault.attr("name"))
        .with("recovery_fabric_name", fabric_primary.attr("name"))
        .with(
            "recovery_source_protection_container_name",
            container_primary.attr("name"),
        )
        .with("recovery_target_protection_container_id", container_secondary.attr("id"))
        .with("recovery_replication_policy_id", policy.attr("id"))
        .with("name", "mapping-{unique_suffix}");

    let vnet_primary = ResourceNode::new(VIRTUAL_NETWORK, "test1")
        .with("name", "net-{unique_suffix}")
        .with("resource_group_name", rg_primary.attr("name"))
        .with(
            "address_space",
            PropertyValue::List(vec![PropertyValue::text("192.168.1.0/24")]),
        )
        .with("location", fabric_primary.attr("location"));

    let subnet_primary = ResourceNode::new(SUBNET, "test1")
        .with("name", "snet-{unique_suffix}")
        .with("resource_group_name", rg_primary.attr("name"))
        .with("virtual_network_name", vnet_primary.attr("name"))
        .with("address_prefix", "192.168.1.0/24");

    let vnet_secondary = ResourceNode::new(VIRTUAL_NETWORK, "test2")
        .with("name", "net-{unique_suffix}")
        .with("resource_group_name", rg_secondary.attr("name"))
        .with(
            "address_space",
            PropertyValue::List(vec![PropertyValue::text("192.168.2.0/24")]),
        )
        .with("location", fabric_secondary.attr("location"));

    let target_subnets = [
        ("test2_1", "acctest-snet-{unique_suffix}_1", "192.168.2.0/27"),
        ("test2_2", "snet-{unique_suffix}_2", "192.168.2.32/27"),
        ("test2_3", "snet-{unique_suffix}_3", "192.168.2.64/27"),
    ]
    .map(|(logical, name, prefix)| {
        ResourceNode::new(SUBNET, logical)
            .with("name", name)
            .with("resource_group_name", rg_secondary.attr("name"))
            .with("virtual_network_name", vnet_secondary.attr("name"))
            .with("address_prefix", prefix)
    });

    let network_mapping = ResourceNode::new(NETWORK_MAPPING, "test")
        .with("resource_group_name", rg_secondary.attr("name"))
        .with("recovery_vault_name", vault.attr("name"))
        .with("name", "mapping-{unique_suffix}")
        .with("source_recovery_fabric_name", fabric_primary.attr("name"))
        .with("target_recovery_fabric_name", fabric_secondary.attr("name"))
        .with("source_network_id", vnet_primary.attr("id"))
        .with("target_network_id", vnet_secondary.attr("id"));

    let nic = ResourceNode::new(NETWORK_INTERFACE, "test")
        .with("name", "vm-{unique_suffix}")
        .with("location", rg_primary.attr("location"))
        .with("resource_group_name", rg_primary.attr("name"))
        .with_block(
            "ip_configuration",
            Block::new()
                .with("name", "vm-{unique_suffix}")
                .with("subnet_id", subnet_primary.attr("id"))
                .with("private_ip_address_allocation", "Dynamic"),
        );

    let vm = ResourceNode::new(VIRTUAL_MACHINE, "test")
        .with("name", "vm-{unique_suffix}")
        .with("location", rg_primary.attr("location"))
        .with("resource_group_name", rg_primary.attr("name"))
        .with("vm_size", "Standard_B1s")
        .with_block(
            "storage_image_reference",
            Block::new()
                .with("publisher", "OpenLogic")
                .with("offer", "CentOS")
                .with("sku", "7.5")
                .with("version", "latest"),
        )
        .with_block(
            "storage_os_disk",
            Block::new()
                .with("name", "disk-{unique_suffix}")
                .with("os_type", "Linux")
                .with("caching", "ReadWrite")
                .with("create_option", "FromImage")
                .with("managed_disk_type", "Premium_LRS"),
        )
        .with_block(
            "os_profile",
            Block::new()
                .with("admin_username", "testadmin")
                .with("admin_password", "Password1234!")
                .with("computer_name", "vm-{unique_suffix}"),
        )
        .with_block(
            "os_profile_linux_config",
            Block::new().with("disable_password_authentication", false),
        )
        .with(
            "network_interface_ids",
            PropertyValue::List(vec![nic.attr("id")]),
        );

    let storage = ResourceNode::new(STORAGE_ACCOUNT, "test")
        .with("name", "acct{unique_suffix}")
        .with("location", rg_primary.attr("location"))
        .with("resource_group_name", rg_primary.attr("name"))
        .with("account_tier", "Standard")
        .with("account_replication_type", "LRS");

    let replicated = ResourceNode::new(REPLICATED_VM, REPLICATED_VM_NAME)
        .with("name", "repl-{unique_suffix}")
        .with("resource_group_name", rg_secondary.attr("name"))
        .with("recovery_vault_name", vault.attr("name"))
        .with("source_vm_id", vm.attr("id"))
        .with("source_recovery_fabric_name", fabric_primary.attr("name"))
        .with("recovery_replication_policy_id", policy.attr("id"))
        .with(
            "source_recovery_protection_container_name",
            container_primary.attr("name"),
        )
        .with("target_resource_group_id", rg_secondary.attr("id"))
        .with("target_recovery_fabric_id", fabric_secondary.attr("id"))
        .with(
            "target_recovery_protection_container_id",
            container_secondary.attr("id"),
        )
        .with_block(
            "managed_disk",
            Block::new()
                .with("disk_id", vm.attr("storage_os_disk.0.managed_disk_id"))
                .with("staging_storage_account_id", storage.attr("id"))
                .with("target_resource_group_id", rg_secondary.attr("id"))
                .with("target_disk_type", "Premium_LRS")
                .with("target_replica_disk_type", "Premium_LRS"),
        )
        .with_block(
            "network_interface",
            Block::new()
                .with("source_network_interface_id", nic.attr("id"))
                .with("target_subnet_name", "snet-{unique_suffix}_2"),
        )
        .depends_on(&container_mapping.address)
        .depends_on(&network_mapping.address);

    let [subnet_2_1, subnet_2_2, subnet_2_3] = target_subnets;
    let nodes = [
        rg_primary,
        rg_secondary,
        vault,
        fabric_primary,
        fabric_secondary,
        container_primary,
        container_secondary,
        policy,
        container_mapping,
        vnet_primary,
        subnet_primary,
        vnet_secondary,
        subnet_2_1,
        subnet_2_2,
        subnet_2_3,
        network_mapping,
        nic,
        vm,
        storage,
        replicated,
    ];

    let mut topology = Topology::new().with_provider(PROVIDER);
    for node in nodes {
        topology.add(node)?;
    }
    Ok(topology)
}
