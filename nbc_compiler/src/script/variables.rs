//! Provisioning variable namespace
//!
//! Every value the node-side provisioning scripts read, resolved from a
//! contract into one ordered map. The same map feeds template expansion and
//! the child process environment.

use crate::contract::constants::{
    cse_paths, sysctl_defaults, vm_size, DEFAULT_LINUX_ADMIN_USER,
    DEFAULT_MAX_LOAD_BALANCER_RULE_COUNT,
};
use crate::contract::{
    BootstrappingMethod, Contract, CustomLinuxOsConfig,
    CustomSearchDomainConfig, HttpProxyConfig, KubeletDisk, LoadBalancerConfig, LoadBalancerSku,
    NetworkConfig, NetworkPlugin, NetworkPolicy, SysctlConfig, UlimitConfig, VmType,
};
use crate::kubelet::kubelet_flags_for_contract;
use crate::utils::{remove_newlines, sorted_key_value_pairs};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::BTreeMap;
use std::fmt;

/// Name to value, iterated in name order
///
/// Values include the bootstrap token and client key material, so `Debug`
/// prints names only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CseVariables {
    values: BTreeMap<String, String>,
}

impl fmt::Debug for CseVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl CseVariables {
    pub fn from_contract(contract: &Contract) -> Self {
        let mut vars = Self::default();
        vars.insert_static_defaults();
        vars.insert_identity(contract);
        vars.insert_cluster(contract);
        vars.insert_network(contract);
        vars.insert_runtime(contract);
        vars.insert_gpu(contract);
        vars.insert_trust(contract);
        vars.insert_proxy(contract.http_proxy());
        vars.insert_cloud(contract);
        vars.insert_linux_os(contract.custom_linux_os());
        vars.insert_search_domain(contract.custom_search_domain());
        vars.insert_tls_bootstrapping(contract);
        vars.insert_kubelet(contract);
        vars.insert_node_options(contract);
        vars
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sorted `NAME=value` entries
    pub fn to_environ(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("{}={}", k, v)).collect()
    }

    pub(crate) fn set(&mut self, name: &str, value: impl ToString) {
        self.values.insert(name.to_string(), value.to_string());
    }

    fn insert_static_defaults(&mut self) {
        self.set("PROVISION_OUTPUT", cse_paths::PROVISION_OUTPUT);
        self.set("MOBY_VERSION", "");
        self.set("CLOUDPROVIDER_BACKOFF", true);
        self.set("CLOUDPROVIDER_BACKOFF_MODE", "v2");
        self.set("CLOUDPROVIDER_BACKOFF_RETRIES", 6);
        self.set("CLOUDPROVIDER_BACKOFF_EXPONENT", 0);
        self.set("CLOUDPROVIDER_BACKOFF_DURATION", 5);
        self.set("CLOUDPROVIDER_BACKOFF_JITTER", 0);
        self.set("CLOUDPROVIDER_RATELIMIT", true);
        self.set("CLOUDPROVIDER_RATELIMIT_QPS", 10);
        self.set("CLOUDPROVIDER_RATELIMIT_QPS_WRITE", 10);
        self.set("CLOUDPROVIDER_RATELIMIT_BUCKET", 100);
        self.set("CLOUDPROVIDER_RATELIMIT_BUCKET_WRITE", 100);
        self.set("CLI_TOOL", "ctr");
        self.set("NETWORK_MODE", "transparent");
        self.set("CONTAINER_RUNTIME", "containerd");
        self.set("NEEDS_CONTAINERD", true);
        self.set("NEEDS_DOCKER_LOGIN", false);

        self.set("CSE_HELPERS_FILEPATH", cse_paths::HELPERS);
        self.set("CSE_DISTRO_HELPERS_FILEPATH", cse_paths::DISTRO_HELPERS);
        self.set("CSE_INSTALL_FILEPATH", cse_paths::INSTALL);
        self.set("CSE_DISTRO_INSTALL_FILEPATH", cse_paths::DISTRO_INSTALL);
        self.set("CSE_CONFIG_FILEPATH", cse_paths::CONFIG);
        self.set("CUSTOM_SEARCH_DOMAIN_FILEPATH", cse_paths::CUSTOM_SEARCH_DOMAIN);
        self.set("DHCPV6_SERVICE_FILEPATH", cse_paths::DHCPV6_SERVICE);
        self.set("DHCPV6_CONFIG_FILEPATH", cse_paths::DHCPV6_CONFIG);
    }

    fn insert_identity(&mut self, contract: &Contract) {
        let auth = contract.auth();
        self.set("ADMINUSER", admin_user(&contract.linux_admin_username));
        self.set("TENANT_ID", &auth.tenant_id);
        self.set("SUBSCRIPTION_ID", &auth.subscription_id);
        self.set("SERVICE_PRINCIPAL_CLIENT_ID", &auth.service_principal_id);
        self.set(
            "SERVICE_PRINCIPAL_FILE_CONTENT",
            base64_or_empty(&auth.service_principal_secret),
        );
        self.set("USER_ASSIGNED_IDENTITY_ID", &auth.assigned_identity_id);
        self.set(
            "USE_MANAGED_IDENTITY_EXTENSION",
            auth.use_managed_identity_extension,
        );
    }

    fn insert_cluster(&mut self, contract: &Contract) {
        let cluster = contract.cluster();
        let network = cluster.cluster_network();
        let load_balancer = cluster.load_balancer();

        self.set("KUBERNETES_VERSION", &contract.kubernetes_version);
        self.set("RESOURCE_GROUP", &cluster.resource_group);
        self.set("LOCATION", &cluster.location);
        self.set("VM_TYPE", vm_type(cluster.vm_type));
        self.set("PRIMARY_AVAILABILITY_SET", &cluster.primary_availability_set);
        self.set("PRIMARY_SCALE_SET", &cluster.primary_scale_set);
        self.set("USE_INSTANCE_METADATA", cluster.use_instance_metadata);

        self.set("SUBNET", &network.subnet);
        self.set("NETWORK_SECURITY_GROUP", &network.security_group_name);
        self.set("VIRTUAL_NETWORK", &network.vnet_name);
        self.set("VIRTUAL_NETWORK_RESOURCE_GROUP", &network.vnet_resource_group);
        self.set("ROUTE_TABLE", &network.route_table);

        self.set(
            "LOAD_BALANCER_DISABLE_OUTBOUND_SNAT",
            load_balancer.disable_outbound_snat,
        );
        self.set(
            "LOAD_BALANCER_SKU",
            load_balancer_sku(load_balancer.load_balancer_sku),
        );
        self.set(
            "EXCLUDE_MASTER_FROM_STANDARD_LB",
            exclude_master_from_standard_lb(load_balancer),
        );
        self.set(
            "MAXIMUM_LOADBALANCER_RULE_COUNT",
            max_load_balancer_rule_count(load_balancer),
        );

        let api_server = contract.api_server();
        self.set("API_SERVER_NAME", &api_server.api_server_name);
        self.set("APISERVER_PUBLIC_KEY", &api_server.api_server_public_key);
        self.set("KUBE_CA_CRT", &contract.kubernetes_ca_cert);

        let binaries = contract.kube_binary();
        self.set("KUBE_BINARY_URL", &binaries.kube_binary_url);
        self.set("CUSTOM_KUBE_BINARY_URL", &binaries.custom_kube_binary_url);
        self.set("PRIVATE_KUBE_BINARY_URL", &binaries.private_kube_binary_url);
        self.set(
            "CREDENTIAL_PROVIDER_DOWNLOAD_URL",
            &binaries.linux_credential_provider_url,
        );
        self.set("KUBEPROXY_URL", &contract.kube_proxy_url);
    }

    fn insert_network(&mut self, contract: &Contract) {
        let network = contract.network();
        self.set("NETWORK_PLUGIN", network_plugin(network.network_plugin));
        self.set("NETWORK_POLICY", network_policy(network.network_policy));
        self.set("VNET_CNI_PLUGINS_URL", &network.vnet_cni_plugins_url);
        self.set(
            "ENSURE_NO_DUPE_PROMISCUOUS_BRIDGE",
            ensure_no_dupe_promiscuous_bridge(network),
        );
        self.set("IPV6_DUAL_STACK_ENABLED", contract.ipv6_dual_stack_enabled);
        self.set("OUTBOUND_COMMAND", &contract.outbound_command);
        self.set(
            "PRIVATE_EGRESS_PROXY_ADDRESS",
            &contract.private_egress_proxy_address,
        );
    }

    fn insert_runtime(&mut self, contract: &Contract) {
        let containerd = contract.containerd();
        self.set(
            "CONTAINERD_DOWNLOAD_URL_BASE",
            &containerd.containerd_download_url_base,
        );
        self.set("CONTAINERD_VERSION", &containerd.containerd_version);
        self.set("CONTAINERD_PACKAGE_URL", &containerd.containerd_package_url);

        let runc = contract.runc();
        self.set("RUNC_VERSION", &runc.runc_version);
        self.set("RUNC_PACKAGE_URL", &runc.runc_package_url);

        let teleport = contract.teleport();
        self.set("TELEPORT_ENABLED", teleport.status);
        self.set(
            "TELEPORTD_PLUGIN_DOWNLOAD_URL",
            &teleport.teleportd_plugin_download_url,
        );

        self.set("IS_KATA", contract.is_kata);
        self.set("ARTIFACT_STREAMING_ENABLED", contract.enable_artifact_streaming);
        self.set(
            "AZURE_PRIVATE_REGISTRY_SERVER",
            &contract.azure_private_registry_server,
        );
        self.set(
            "BOOTSTRAP_PROFILE_CONTAINER_REGISTRY_SERVER",
            &contract.bootstrap_profile_container_registry_server,
        );
    }

    fn insert_gpu(&mut self, contract: &Contract) {
        let gpu = contract.gpu();
        self.set("GPU_NODE", gpu.enable_nvidia.unwrap_or(false));
        self.set("SGX_NODE", is_sgx_enabled_sku(&contract.vm_size));
        self.set("MIG_NODE", !gpu.gpu_instance_profile.is_empty());
        self.set("GPU_INSTANCE_PROFILE", &gpu.gpu_instance_profile);
        self.set("CONFIG_GPU_DRIVER_IF_NEEDED", gpu.config_gpu_driver);
        self.set("ENABLE_GPU_DEVICE_PLUGIN_IF_NEEDED", gpu.gpu_device_plugin);
    }

    fn insert_trust(&mut self, contract: &Contract) {
        let certs = &contract.custom_ca_certs;
        self.set("SHOULD_CONFIGURE_CUSTOM_CA_TRUST", !certs.is_empty());
        self.set("CUSTOM_CA_TRUST_COUNT", certs.len());
        for (index, cert) in certs.iter().enumerate() {
            self.set(&format!("CUSTOM_CA_CERT_{}", index), remove_newlines(cert));
        }
    }

    fn insert_proxy(&mut self, proxy: &HttpProxyConfig) {
        self.set(
            "SHOULD_CONFIGURE_HTTP_PROXY",
            !proxy.http_proxy.is_empty() || !proxy.https_proxy.is_empty(),
        );
        self.set(
            "SHOULD_CONFIGURE_HTTP_PROXY_CA",
            !proxy.proxy_trusted_ca.is_empty(),
        );
        self.set("HTTP_PROXY_TRUSTED_CA", remove_newlines(&proxy.proxy_trusted_ca));
        self.set("HTTP_PROXY_URLS", &proxy.http_proxy);
        self.set("HTTPS_PROXY_URLS", &proxy.https_proxy);
        self.set("NO_PROXY_URLS", proxy.no_proxy_entries.join(","));
        self.set("PROXY_VARS", proxy_variables(proxy));
    }

    fn insert_cloud(&mut self, contract: &Contract) {
        let custom = contract.is_aks_custom_cloud();
        let environment = contract.target_environment();
        let environment_filepath = if custom {
            format!("/etc/kubernetes/{}.json", environment)
        } else {
            String::new()
        };
        let custom_cloud = contract.custom_cloud();

        self.set("TARGET_ENVIRONMENT", environment);
        self.set("TARGET_CLOUD", contract.target_cloud());
        self.set("AZURE_ENVIRONMENT_FILEPATH", environment_filepath);
        self.set("IS_CUSTOM_CLOUD", custom);
        self.set("CUSTOM_ENV_JSON", &custom_cloud.custom_env_json_content);
        self.set(
            "AKS_CUSTOM_CLOUD_CONTAINER_REGISTRY_DNS_SUFFIX",
            &custom_cloud.container_registry_dns_suffix,
        );
    }

    fn insert_linux_os(&mut self, os: &CustomLinuxOsConfig) {
        let ulimit = os.ulimit();
        self.set("SYSCTL_CONTENT", sysctl_content(os.sysctl()));
        self.set("SHOULD_CONFIG_CONTAINERD_ULIMITS", ulimit.is_set());
        self.set("CONTAINERD_ULIMITS", ulimit_content(ulimit));
        self.set(
            "SHOULD_CONFIG_SWAP_FILE",
            os.enable_swap_config && os.swap_file_size > 0,
        );
        self.set("SWAP_FILE_SIZE_MB", os.swap_file_size);
        self.set(
            "SHOULD_CONFIG_TRANSPARENT_HUGE_PAGE",
            !os.transparent_defrag.is_empty() || !os.transparent_hugepage_support.is_empty(),
        );
        self.set("THP_ENABLED", &os.transparent_hugepage_support);
        self.set("THP_DEFRAG", &os.transparent_defrag);
    }

    fn insert_search_domain(&mut self, domain: &CustomSearchDomainConfig) {
        self.set("HAS_CUSTOM_SEARCH_DOMAIN", has_search_domain(domain));
        self.set("CUSTOM_SEARCH_DOMAIN_NAME", &domain.domain_name);
        self.set("CUSTOM_SEARCH_REALM_USER", &domain.realm_user);
        self.set("CUSTOM_SEARCH_REALM_PASSWORD", &domain.realm_password);
    }

    fn insert_tls_bootstrapping(&mut self, contract: &Contract) {
        let tls = contract.tls_bootstrapping();
        let secure = tls.enable_secure_tls_bootstrapping.unwrap_or(false)
            || tls.bootstrapping_method == BootstrappingMethod::UseSecureTlsBootstrapping;

        self.set("TLS_BOOTSTRAP_TOKEN", &tls.tls_bootstrapping_token);
        self.set("ENABLE_TLS_BOOTSTRAPPING", !tls.tls_bootstrapping_token.is_empty());
        self.set("ENABLE_SECURE_TLS_BOOTSTRAPPING", secure);
        self.set(
            "CUSTOM_SECURE_TLS_BOOTSTRAP_AAD_SERVER_APP_ID",
            &tls.custom_secure_tls_bootstrapping_app_id,
        );
    }

    fn insert_kubelet(&mut self, contract: &Contract) {
        let kubelet = contract.kubelet();
        let flags = kubelet_flags_for_contract(contract);

        self.set("KUBELET_FLAGS", sorted_key_value_pairs(&flags, " "));
        self.set(
            "KUBELET_NODE_LABELS",
            sorted_key_value_pairs(&kubelet.kubelet_node_labels, ","),
        );
        self.set("KUBELET_CONFIG_FILE_ENABLED", kubelet.enable_kubelet_config_file);
        self.set(
            "KUBELET_CONFIG_FILE_CONTENT",
            STANDARD.encode(kubelet.kubelet_config_file_content.as_bytes()),
        );
        self.set("KUBELET_CLIENT_CONTENT", &kubelet.kubelet_client_key);
        self.set("KUBELET_CLIENT_CERT_CONTENT", &kubelet.kubelet_client_cert_content);
        self.set(
            "HAS_KUBELET_DISK_TYPE",
            kubelet.kubelet_disk_type == KubeletDisk::TempDisk,
        );
    }

    fn insert_node_options(&mut self, contract: &Contract) {
        self.set("IS_VHD", contract.is_vhd.unwrap_or(true));
        self.set("DISABLE_SSH", contract.enable_ssh.map_or(false, |enabled| !enabled));
        self.set("ENABLE_UNATTENDED_UPGRADES", contract.enable_unattended_upgrade);
        self.set("ENABLE_HOSTS_CONFIG_AGENT", contract.enable_hosts_config_agent);
        self.set("NEEDS_CGROUPV2", contract.needs_cgroupv2);
        self.set("MESSAGE_OF_THE_DAY", &contract.message_of_the_day);
    }
}

fn admin_user(username: &str) -> &str {
    if username.is_empty() {
        DEFAULT_LINUX_ADMIN_USER
    } else {
        username
    }
}

fn base64_or_empty(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        STANDARD.encode(value.as_bytes())
    }
}

fn vm_type(value: VmType) -> &'static str {
    match value {
        VmType::Standard => "standard",
        VmType::Vmss => "vmss",
        VmType::Unspecified => "",
    }
}

fn network_plugin(value: NetworkPlugin) -> &'static str {
    match value {
        NetworkPlugin::Azure => "azure",
        NetworkPlugin::Kubenet => "kubenet",
        NetworkPlugin::Unspecified => "",
    }
}

fn network_policy(value: NetworkPolicy) -> &'static str {
    match value {
        NetworkPolicy::Azure => "azure",
        NetworkPolicy::Calico => "calico",
        NetworkPolicy::Unspecified => "",
    }
}

fn load_balancer_sku(value: LoadBalancerSku) -> &'static str {
    match value {
        LoadBalancerSku::Basic => "basic",
        LoadBalancerSku::Standard => "Standard",
        LoadBalancerSku::Unspecified => "",
    }
}

fn exclude_master_from_standard_lb(lb: &LoadBalancerConfig) -> bool {
    lb.exclude_master_from_standard_load_balancer.unwrap_or(true)
}

fn max_load_balancer_rule_count(lb: &LoadBalancerConfig) -> i32 {
    lb.max_load_balancer_rule_count
        .unwrap_or(DEFAULT_MAX_LOAD_BALANCER_RULE_COUNT)
}

fn ensure_no_dupe_promiscuous_bridge(network: &NetworkConfig) -> bool {
    network.network_plugin == NetworkPlugin::Kubenet
        && network.network_policy != NetworkPolicy::Calico
}

fn is_sgx_enabled_sku(size: &str) -> bool {
    size == vm_size::STANDARD_DC2S || size == vm_size::STANDARD_DC4S
}

fn has_search_domain(domain: &CustomSearchDomainConfig) -> bool {
    !domain.domain_name.is_empty()
        && !domain.realm_user.is_empty()
        && !domain.realm_password.is_empty()
}

/// `export` prefix for provisioning steps that run behind the proxy
fn proxy_variables(proxy: &HttpProxyConfig) -> String {
    let mut vars = String::new();
    if !proxy.http_proxy.is_empty() {
        vars = format!("export http_proxy=\"{}\";", proxy.http_proxy);
    }
    if !proxy.https_proxy.is_empty() {
        vars = format!("export HTTPS_PROXY=\"{}\"; {}", proxy.https_proxy, vars);
    }
    if !proxy.no_proxy_entries.is_empty() {
        vars = format!(
            "export NO_PROXY=\"{}\"; {}",
            proxy.no_proxy_entries.join(","),
            vars
        );
    }
    vars
}

fn ulimit_content(ulimit: &UlimitConfig) -> String {
    if !ulimit.is_set() {
        return String::new();
    }

    let mut limits = BTreeMap::new();
    if let Some(no_file) = &ulimit.no_file {
        limits.insert("LimitNOFILE", no_file.as_str());
    }
    if let Some(memlock) = &ulimit.max_locked_memory {
        limits.insert("LimitMEMLOCK", memlock.as_str());
    }

    format!("[Service]\n{}", sorted_key_value_pairs(limits, " "))
}

/// End of a `"start end"` port range; `None` unless both ends are positive
/// and ordered
fn port_range_end(range: &str) -> Option<i64> {
    let parts: Vec<&str> = range.split(' ').collect();
    let [start, end] = parts.as_slice() else {
        return None;
    };
    let start: i64 = start.parse().ok()?;
    let end: i64 = end.parse().ok()?;

    (start > 0 && end > 0 && start < end).then_some(end)
}

/// Base64 of sorted `key=value` lines
fn sysctl_content(sysctl: &SysctlConfig) -> String {
    let mut values: BTreeMap<&'static str, String> = BTreeMap::new();

    values.insert("net.ipv4.tcp_retries2", sysctl_defaults::NET_IPV4_TCP_RETRIES2.to_string());
    values.insert("net.core.message_burst", sysctl_defaults::NET_CORE_MESSAGE_BURST.to_string());
    values.insert("net.core.message_cost", sysctl_defaults::NET_CORE_MESSAGE_COST.to_string());

    let with_default = [
        ("net.core.somaxconn", sysctl.net_core_somaxconn, sysctl_defaults::NET_CORE_SOMAXCONN),
        (
            "net.ipv4.tcp_max_syn_backlog",
            sysctl.net_ipv4_tcp_max_syn_backlog,
            sysctl_defaults::NET_IPV4_TCP_MAX_SYN_BACKLOG,
        ),
        (
            "net.ipv4.neigh.default.gc_thresh1",
            sysctl.net_ipv4_neigh_default_gc_thresh1,
            sysctl_defaults::NET_IPV4_NEIGH_DEFAULT_GC_THRESH1,
        ),
        (
            "net.ipv4.neigh.default.gc_thresh2",
            sysctl.net_ipv4_neigh_default_gc_thresh2,
            sysctl_defaults::NET_IPV4_NEIGH_DEFAULT_GC_THRESH2,
        ),
        (
            "net.ipv4.neigh.default.gc_thresh3",
            sysctl.net_ipv4_neigh_default_gc_thresh3,
            sysctl_defaults::NET_IPV4_NEIGH_DEFAULT_GC_THRESH3,
        ),
    ];
    for (key, value, default) in with_default {
        values.insert(key, value.unwrap_or(default).to_string());
    }

    let optional = [
        ("net.core.netdev_max_backlog", sysctl.net_core_netdev_max_backlog),
        ("net.core.rmem_default", sysctl.net_core_rmem_default),
        ("net.core.rmem_max", sysctl.net_core_rmem_max),
        ("net.core.wmem_default", sysctl.net_core_wmem_default),
        ("net.core.wmem_max", sysctl.net_core_wmem_max),
        ("net.core.optmem_max", sysctl.net_core_optmem_max),
        ("net.ipv4.tcp_max_tw_buckets", sysctl.net_ipv4_tcp_max_tw_buckets),
        ("net.ipv4.tcp_fin_timeout", sysctl.net_ipv4_tcp_fin_timeout),
        ("net.ipv4.tcp_keepalive_time", sysctl.net_ipv4_tcp_keepalive_time),
        ("net.ipv4.tcp_keepalive_probes", sysctl.net_ipv4_tcp_keepalive_probes),
        ("net.ipv4.tcp_keepalive_intvl", sysctl.net_ipv4_tcp_keepalive_intvl),
        ("net.netfilter.nf_conntrack_max", sysctl.net_netfilter_nf_conntrack_max),
        ("net.netfilter.nf_conntrack_buckets", sysctl.net_netfilter_nf_conntrack_buckets),
        ("fs.inotify.max_user_watches", sysctl.fs_inotify_max_user_watches),
        ("fs.file-max", sysctl.fs_file_max),
        ("fs.aio-max-nr", sysctl.fs_aio_max_nr),
        ("fs.nr_open", sysctl.fs_nr_open),
        ("kernel.threads-max", sysctl.kernel_threads_max),
        ("vm.max_map_count", sysctl.vm_max_map_count),
        ("vm.swappiness", sysctl.vm_swappiness),
        ("vm.vfs_cache_pressure", sysctl.vm_vfs_cache_pressure),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            values.insert(key, value.to_string());
        }
    }

    if let Some(reuse) = sysctl.net_ipv4_tcp_tw_reuse {
        let flag = if reuse { "1" } else { "0" };
        values.insert("net.ipv4.tcp_tw_reuse", flag.to_string());
    }

    let port_range = &sysctl.net_ipv4_ip_local_port_range;
    if !port_range.is_empty() {
        values.insert("net.ipv4.ip_local_port_range", port_range.clone());
        let reserved = i64::from(sysctl_defaults::IP_LOCAL_RESERVED_PORTS);
        if port_range_end(port_range).is_some_and(|end| end > reserved) {
            values.insert(
                "net.ipv4.ip_local_reserved_ports",
                sysctl_defaults::IP_LOCAL_RESERVED_PORTS.to_string(),
            );
        }
    }

    STANDARD.encode(sorted_key_value_pairs(values, "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{
        ClusterConfig, CustomCloudConfig, GpuConfig, KubeletConfig, TlsBootstrappingConfig,
    };
    use crate::normalize::normalize;

    fn decode(value: &str) -> String {
        String::from_utf8(STANDARD.decode(value).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_contract_defaults() {
        let vars = CseVariables::from_contract(&normalize(Contract::default()));

        assert_eq!(vars.get("IS_KATA"), Some("false"));
        assert_eq!(vars.get("ENABLE_UNATTENDED_UPGRADES"), Some("false"));
        assert_eq!(vars.get("CUSTOM_CA_TRUST_COUNT"), Some("0"));
        assert_eq!(vars.get("TARGET_ENVIRONMENT"), Some("AzurePublicCloud"));
        assert_eq!(vars.get("TARGET_CLOUD"), Some("AzurePublicCloud"));
        assert_eq!(vars.get("ADMINUSER"), Some("azureuser"));
        assert_eq!(vars.get("IS_VHD"), Some("true"));
        assert_eq!(vars.get("DISABLE_SSH"), Some("false"));
        assert_eq!(vars.get("EXCLUDE_MASTER_FROM_STANDARD_LB"), Some("true"));
        assert_eq!(vars.get("MAXIMUM_LOADBALANCER_RULE_COUNT"), Some("250"));
        assert_eq!(vars.get("SHOULD_CONFIG_CONTAINERD_ULIMITS"), Some("false"));
        assert_eq!(vars.get("CONTAINERD_ULIMITS"), Some(""));
        assert_eq!(vars.get("PROXY_VARS"), Some(""));
        assert_eq!(vars.get("NETWORK_PLUGIN"), Some(""));
        assert_eq!(vars.get("SERVICE_PRINCIPAL_FILE_CONTENT"), Some(""));
        assert_eq!(vars.get("AZURE_ENVIRONMENT_FILEPATH"), Some(""));
    }

    #[test]
    fn test_custom_cloud_forces_stack_cloud() {
        let contract = Contract {
            custom_cloud: Some(CustomCloudConfig {
                custom_cloud_env_name: "AKSCustom".into(),
                ..Default::default()
            }),
            cluster: Some(ClusterConfig {
                location: "chinaeast2".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let vars = CseVariables::from_contract(&contract);

        assert_eq!(vars.get("TARGET_CLOUD"), Some("AzureStackCloud"));
        assert_eq!(vars.get("TARGET_ENVIRONMENT"), Some("akscustom"));
        assert_eq!(vars.get("IS_CUSTOM_CLOUD"), Some("true"));
        assert_eq!(
            vars.get("AZURE_ENVIRONMENT_FILEPATH"),
            Some("/etc/kubernetes/akscustom.json")
        );
    }

    #[test]
    fn test_sysctl_defaults_and_reserved_ports() {
        let defaults = decode(&sysctl_content(&SysctlConfig::default()));
        assert!(defaults.starts_with("net.core.message_burst=80\n"));
        assert!(defaults.contains("net.core.somaxconn=16384"));
        assert!(!defaults.contains("ip_local_reserved_ports"));

        let tuned = SysctlConfig {
            net_core_somaxconn: Some(4096),
            net_ipv4_tcp_tw_reuse: Some(true),
            net_ipv4_ip_local_port_range: "32768 65535".into(),
            ..Default::default()
        };
        let content = decode(&sysctl_content(&tuned));
        assert!(content.contains("net.core.somaxconn=4096"));
        assert!(content.contains("net.ipv4.tcp_tw_reuse=1"));
        assert!(content.contains("net.ipv4.ip_local_port_range=32768 65535"));
        assert!(content.contains("net.ipv4.ip_local_reserved_ports=65330"));

        let narrow = SysctlConfig {
            net_ipv4_ip_local_port_range: "1024 60000".into(),
            ..Default::default()
        };
        assert!(!decode(&sysctl_content(&narrow)).contains("reserved_ports"));
    }

    #[test]
    fn test_port_range_end() {
        assert_eq!(port_range_end("32768 65535"), Some(65535));
        assert_eq!(port_range_end("65535 32768"), None);
        assert_eq!(port_range_end("0 100"), None);
        assert_eq!(port_range_end("1 2 3"), None);
        assert_eq!(port_range_end("a b"), None);
    }

    #[test]
    fn test_ulimit_content() {
        let ulimit = UlimitConfig {
            no_file: Some("1048576".into()),
            max_locked_memory: Some("75000".into()),
        };
        assert_eq!(
            ulimit_content(&ulimit),
            "[Service]\nLimitMEMLOCK=75000 LimitNOFILE=1048576"
        );
    }

    #[test]
    fn test_proxy_variables_order() {
        let proxy = HttpProxyConfig {
            http_proxy: "http://proxy:3128".into(),
            https_proxy: "https://proxy:3129".into(),
            no_proxy_entries: vec!["localhost".into(), "10.0.0.0/8".into()],
            ..Default::default()
        };
        assert_eq!(
            proxy_variables(&proxy),
            "export NO_PROXY=\"localhost,10.0.0.0/8\"; export HTTPS_PROXY=\"https://proxy:3129\"; export http_proxy=\"http://proxy:3128\";"
        );
    }

    #[test]
    fn test_custom_ca_certs_enumerated() {
        let contract = Contract {
            custom_ca_certs: vec!["-----BEGIN\nabc\n-----END".into(), "second".into()],
            ..Default::default()
        };
        let vars = CseVariables::from_contract(&contract);

        assert_eq!(vars.get("SHOULD_CONFIGURE_CUSTOM_CA_TRUST"), Some("true"));
        assert_eq!(vars.get("CUSTOM_CA_TRUST_COUNT"), Some("2"));
        assert_eq!(vars.get("CUSTOM_CA_CERT_0"), Some("-----BEGINabc-----END"));
        assert_eq!(vars.get("CUSTOM_CA_CERT_1"), Some("second"));
    }

    #[test]
    fn test_kubelet_and_gpu_values() {
        let contract = Contract {
            kubernetes_version: "1.29.0".into(),
            vm_size: "Standard_DC2s".into(),
            gpu: Some(GpuConfig {
                enable_nvidia: Some(true),
                gpu_instance_profile: "MIG1g".into(),
                ..Default::default()
            }),
            kubelet: Some(KubeletConfig {
                kubelet_flags: [("--v", "2"), ("--max-pods", "30")]
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                kubelet_node_labels: [("b", "2"), ("a", "1")]
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                kubelet_disk_type: KubeletDisk::TempDisk,
                ..Default::default()
            }),
            ..Default::default()
        };
        let vars = CseVariables::from_contract(&contract);

        assert_eq!(vars.get("KUBELET_FLAGS"), Some("--max-pods=30 --v=2"));
        assert_eq!(vars.get("KUBELET_NODE_LABELS"), Some("a=1,b=2"));
        assert_eq!(vars.get("HAS_KUBELET_DISK_TYPE"), Some("true"));
        assert_eq!(vars.get("GPU_NODE"), Some("true"));
        assert_eq!(vars.get("MIG_NODE"), Some("true"));
        assert_eq!(vars.get("SGX_NODE"), Some("true"));
    }

    #[test]
    fn test_debug_lists_names_only() {
        let contract = Contract {
            tls_bootstrapping: Some(TlsBootstrappingConfig {
                tls_bootstrapping_token: "abcdef.0123456789abcdef".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let vars = CseVariables::from_contract(&contract);

        assert_eq!(vars.get("ENABLE_TLS_BOOTSTRAPPING"), Some("true"));
        let rendered = format!("{:?}", vars);
        assert!(rendered.contains("TLS_BOOTSTRAP_TOKEN"));
        assert!(!rendered.contains("0123456789abcdef"));
    }

    #[test]
    fn test_environ_is_sorted() {
        let vars = CseVariables::from_contract(&Contract::default());
        let environ = vars.to_environ();
        let mut sorted = environ.clone();
        sorted.sort();
        assert_eq!(environ, sorted);
        assert!(environ.contains(&"CLI_TOOL=ctr".to_string()));
    }
}
